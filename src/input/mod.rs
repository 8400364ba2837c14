//! Keyboard input: shortcut resolution.

pub mod keybindings;
