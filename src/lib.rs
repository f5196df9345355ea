//! UnderMine support plugin
//!
//! Teaches a mod-management host application how to handle UnderMine:
//! locating the installed game, recognizing mod archives, planning the
//! file copies that stage them, and the one-time binary patch that lets
//! the game load third-party code.

pub mod game;
pub mod host;
pub mod install;
pub mod logging;
pub mod setup;
pub mod steam;
