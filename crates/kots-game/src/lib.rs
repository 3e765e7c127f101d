#![allow(clippy::too_many_arguments, clippy::collapsible_if, clippy::collapsible_else_if,
         clippy::float_cmp, clippy::needless_range_loop, clippy::comparison_chain)]
// Game module — KOTS entity utilities, trigger dispatch and the grapple hook

pub mod error;
pub mod game;
pub mod game_import;
pub mod g_local;
pub mod dispatch;
pub mod g_utils;
pub mod g_trigger;
pub mod g_combat;
pub mod g_phys;
pub mod g_main;
pub mod p_weapon;
pub mod kots_character;
pub mod kots_items;
pub mod kots_hook;

#[cfg(test)]
pub(crate) mod test_support;
