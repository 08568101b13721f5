//! Popups drawn on top of the flow panel.

pub mod dialog;
pub mod notification;
