//! Inbound `S88` commands.
//!
//! The command dispatcher hands over the whitespace-separated arguments
//! that followed the `S88` keyword; [`S88Command::from_args`] turns them
//! into a typed request for the
//! [`S88BusManager`](crate::s88::manager::S88BusManager).

/// Requests accepted by the S88 command surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum S88Command {
    /// `S88` — broadcast every bus and its sensor states.
    List,

    /// `S88 id` — delete a bus and all of its sensors.
    Remove { id: u8 },

    /// `S88 id dataPin count` — create or update a bus.
    CreateOrUpdate { id: u8, data_pin: u8, count: u16 },
}

impl S88Command {
    /// Parse the argument list.  Returns `None` for wrong arity or any
    /// argument that is not a number in range.
    pub fn from_args(args: &[&str]) -> Option<Self> {
        match args {
            [] => Some(Self::List),
            [id] => Some(Self::Remove { id: id.parse().ok()? }),
            [id, pin, count] => Some(Self::CreateOrUpdate {
                id: id.parse().ok()?,
                data_pin: pin.parse().ok()?,
                count: count.parse().ok()?,
            }),
            _ => None,
        }
    }
}
