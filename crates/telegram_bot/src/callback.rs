//! Inline button payloads.
//!
//! A payload is `tag[:param]*`, e.g. `group_managers:-1001234:2`. Telegram
//! caps callback data at 64 bytes; the longest tag with two 64-bit ids fits.

use std::{fmt, str::FromStr};

use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Action {
    Groups { page: u32 },
    Group { chat_id: i64 },
    ChangeOwner { chat_id: i64 },
    Managers { chat_id: i64, page: u32 },
    AddManager { chat_id: i64 },
    Manager { chat_id: i64, manager_id: i64 },
    RemoveManager { chat_id: i64, manager_id: i64 },
    Functions { chat_id: i64, page: u32 },
    Noop,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CallbackParseError {
    #[error("unknown callback tag: {0}")]
    UnknownTag(String),
    #[error("malformed callback data: {0}")]
    Malformed(String),
}

impl Action {
    pub(crate) fn pack(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Groups { page } => write!(f, "groups:{page}"),
            Self::Group { chat_id } => write!(f, "group:{chat_id}"),
            Self::ChangeOwner { chat_id } => write!(f, "group_change_owner:{chat_id}"),
            Self::Managers { chat_id, page } => write!(f, "group_managers:{chat_id}:{page}"),
            Self::AddManager { chat_id } => write!(f, "group_add_manager:{chat_id}"),
            Self::Manager {
                chat_id,
                manager_id,
            } => write!(f, "group_manager:{chat_id}:{manager_id}"),
            Self::RemoveManager {
                chat_id,
                manager_id,
            } => write!(f, "group_manager_remove:{chat_id}:{manager_id}"),
            Self::Functions { chat_id, page } => write!(f, "group_functions:{chat_id}:{page}"),
            Self::Noop => write!(f, "noop"),
        }
    }
}

impl FromStr for Action {
    type Err = CallbackParseError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        let mut parts = data.split(':');
        let tag = parts.next().unwrap_or_default();
        let params: Vec<&str> = parts.collect();
        let malformed = || CallbackParseError::Malformed(data.to_string());

        let id = |idx: usize| -> Result<i64, CallbackParseError> {
            params
                .get(idx)
                .and_then(|p| p.parse::<i64>().ok())
                .ok_or_else(malformed)
        };
        let page = |idx: usize| -> Result<u32, CallbackParseError> {
            params
                .get(idx)
                .and_then(|p| p.parse::<u32>().ok())
                .filter(|p| *p > 0)
                .ok_or_else(malformed)
        };
        let arity = |expected: usize| -> Result<(), CallbackParseError> {
            if params.len() == expected {
                Ok(())
            } else {
                Err(malformed())
            }
        };

        let action = match tag {
            "groups" => {
                arity(1)?;
                Self::Groups { page: page(0)? }
            }
            "group" => {
                arity(1)?;
                Self::Group { chat_id: id(0)? }
            }
            "group_change_owner" => {
                arity(1)?;
                Self::ChangeOwner { chat_id: id(0)? }
            }
            "group_managers" => {
                arity(2)?;
                Self::Managers {
                    chat_id: id(0)?,
                    page: page(1)?,
                }
            }
            "group_add_manager" => {
                arity(1)?;
                Self::AddManager { chat_id: id(0)? }
            }
            "group_manager" => {
                arity(2)?;
                Self::Manager {
                    chat_id: id(0)?,
                    manager_id: id(1)?,
                }
            }
            "group_manager_remove" => {
                arity(2)?;
                Self::RemoveManager {
                    chat_id: id(0)?,
                    manager_id: id(1)?,
                }
            }
            "group_functions" => {
                arity(2)?;
                Self::Functions {
                    chat_id: id(0)?,
                    page: page(1)?,
                }
            }
            "noop" => {
                arity(0)?;
                Self::Noop
            }
            other => return Err(CallbackParseError::UnknownTag(other.to_string())),
        };
        Ok(action)
    }
}
