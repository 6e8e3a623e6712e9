//! Reversible datastore mutations.
//!
//! Every change to a [`Datastore`](crate::tables::Datastore) is expressed as
//! a [`Command`]. Applying one performs the change and hands back the command
//! that undoes it, which is what makes the undo history possible. A command
//! that does not fit the current state changes nothing and yields `None`.
//! Cell values are stored exactly as given; coercion to the column kind is
//! done by [`Store`](crate::store::Store) before a command is built.
//!
//! Deletions are only defined on blank targets. To delete a populated row,
//! first null its cells and clear its flags, then issue
//! [`Command::DeleteEmptyRow`]; the inverse of each step then recreates the
//! row exactly. The store performs this sequence inside a transaction.

mod command;
mod operations;

pub use command::{ColumnProperty, Command, TableProperty};
pub use operations::apply_command;
