//! Area contract.

use crate::{format_message, Flag, MessageParams, Player};

/// Names of the players that own an area.
///
/// Player names compare case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OwnerList(Vec<String>);

impl OwnerList {
    pub fn new<I, S>(owners: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(owners.into_iter().map(Into::into).collect())
    }

    pub fn contains(&self, player_name: &str) -> bool {
        self.0.iter().any(|owner| owner.eq_ignore_ascii_case(player_name))
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn first(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A territorial region managed by the Flags framework.
///
/// The world itself is also an area; it simply has no ownership.
pub trait Area: Send + Sync {
    fn name(&self) -> &str;

    /// Kind of area, e.g. "world" or "claim".
    fn area_type(&self) -> &str;

    /// The flag's value in this area, falling back to the flag's default.
    fn value(&self, flag: &Flag) -> bool;

    /// Whether `player` is on this area's trust list for `flag`.
    fn has_trust(&self, flag: &Flag, player: &dyn Player) -> bool;

    /// Ownership information, or `None` if this area cannot be owned.
    fn ownership(&self) -> Option<&OwnerList>;

    /// Template used for this area's messages about `flag`.
    fn message_template<'a>(&self, flag: &'a Flag) -> &'a str {
        if self.ownership().is_some() {
            flag.area_message()
        } else {
            flag.world_message()
        }
    }

    /// The flag's message for this area, optionally addressed to a player.
    fn message(&self, flag: &Flag, player_name: Option<&str>) -> String {
        let params = MessageParams {
            area_type: self.area_type(),
            area_name: self.name(),
            owner: self.ownership().and_then(OwnerList::first),
            player: player_name,
        };
        format_message(self.message_template(flag), &params)
    }

    /// True if `player_name` owns this area. Always false for areas that
    /// cannot be owned.
    fn is_owner(&self, player_name: &str) -> bool {
        self.ownership()
            .map_or(false, |owners| owners.contains(player_name))
    }
}
