use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::{DashMap, DashSet, mapref::entry::Entry};
use time::OffsetDateTime;

use crate::state::{
    bet::{Bet, BetError, LockReason},
    game::Player,
    matches::MatchId,
};

#[derive(Debug, Clone)]
struct BookEntry {
    bet: Bet,
    placement: Placement,
}

/// Ordering stamps of an accepted bet, drawn from one counter per book.
///
/// `sequence` is fixed by the first submission for a (match, player) pair and
/// orders bets for scoring. `revision` grows with every accepted write, so a
/// store can tell a stale write from a newer one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Placement {
    /// Position of the first submission for the pair.
    pub sequence: u64,
    /// Stamp of this particular write.
    pub revision: u64,
}

/// Concurrent record of the current bet of every (match, player) pair.
///
/// Submissions may come from any task while the coordinator loop closes
/// matches. Submission checks run under the entry guard and closing marks the
/// match before locking its entries, so a submission either lands before the
/// lock sweep (and gets locked by it) or observes the closed match.
#[derive(Debug, Default)]
pub struct BetBook {
    entries: DashMap<(MatchId, Player), BookEntry>,
    closed: DashSet<MatchId>,
    next_stamp: AtomicU64,
}

impl BetBook {
    /// Create an empty book.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record or replace the bet of `player` on the bet's match.
    ///
    /// Rejected when the match is closed, when the stored bet is locked, or
    /// when `submitted_at` is not strictly before `kickoff`. A replacement keeps
    /// the submission position of the first bet for the pair and gets a new revision.
    pub fn place(
        &self,
        player: &Player,
        bet: Bet,
        kickoff: OffsetDateTime,
        submitted_at: OffsetDateTime,
    ) -> Result<Placement, BetError> {
        let match_id = bet.match_id();
        let immutable = |reason| BetError::Immutable {
            match_id,
            player: player.clone(),
            reason,
        };

        match self.entries.entry((match_id, player.clone())) {
            Entry::Occupied(mut occupied) => {
                if self.closed.contains(&match_id) {
                    return Err(immutable(LockReason::MatchFinished));
                }
                if occupied.get().bet.is_locked() {
                    return Err(immutable(LockReason::AlreadyLocked));
                }
                if submitted_at >= kickoff {
                    return Err(immutable(LockReason::KickedOff));
                }
                let entry = occupied.get_mut();
                entry.bet = bet;
                entry.placement.revision = self.stamp();
                Ok(entry.placement)
            }
            Entry::Vacant(vacant) => {
                if self.closed.contains(&match_id) {
                    return Err(immutable(LockReason::MatchFinished));
                }
                if submitted_at >= kickoff {
                    return Err(immutable(LockReason::KickedOff));
                }
                let stamp = self.stamp();
                let placement = Placement {
                    sequence: stamp,
                    revision: stamp,
                };
                vacant.insert(BookEntry { bet, placement });
                Ok(placement)
            }
        }
    }

    /// Insert a previously persisted bet without applying submission rules.
    ///
    /// The persisted stamps are kept, and later submissions are stamped after
    /// them. An entry already holding a newer revision is left alone.
    pub fn restore(&self, player: Player, bet: Bet, placement: Placement) {
        let floor = placement.sequence.max(placement.revision) + 1;
        self.next_stamp.fetch_max(floor, Ordering::Relaxed);

        match self.entries.entry((bet.match_id(), player)) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().placement.revision < placement.revision {
                    occupied.insert(BookEntry { bet, placement });
                }
            }
            Entry::Vacant(vacant) => {
                vacant.insert(BookEntry { bet, placement });
            }
        }
    }

    fn stamp(&self) -> u64 {
        self.next_stamp.fetch_add(1, Ordering::Relaxed)
    }

    /// Close `match_id` to further submissions and lock every bet on it.
    ///
    /// Returns the locked bets in submission order.
    pub fn close_match(&self, match_id: MatchId) -> Vec<(Player, Bet)> {
        self.closed.insert(match_id);

        let mut locked = Vec::new();
        for mut entry in self.entries.iter_mut() {
            let ((bet_match, player), value) = entry.pair_mut();
            if *bet_match != match_id {
                continue;
            }
            value.bet.lock();
            locked.push((value.placement.sequence, player.clone(), value.bet.clone()));
        }

        into_submission_order(locked)
    }

    /// Whether the match was closed by [`BetBook::close_match`].
    pub fn is_closed(&self, match_id: MatchId) -> bool {
        self.closed.contains(&match_id)
    }

    /// Current bet of `player` on `match_id`.
    pub fn get(&self, match_id: MatchId, player: &Player) -> Option<Bet> {
        self.entries
            .get(&(match_id, player.clone()))
            .map(|entry| entry.bet.clone())
    }

    /// Bets recorded on `match_id`, in submission order.
    pub fn bets_for_match(&self, match_id: MatchId) -> Vec<(Player, Bet)> {
        let bets = self
            .entries
            .iter()
            .filter(|entry| entry.key().0 == match_id)
            .map(|entry| {
                let sequence = entry.placement.sequence;
                (sequence, entry.key().1.clone(), entry.bet.clone())
            })
            .collect();
        into_submission_order(bets)
    }

    /// Number of recorded bets.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no bet has been recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn into_submission_order(mut bets: Vec<(u64, Player, Bet)>) -> Vec<(Player, Bet)> {
    bets.sort_by_key(|(sequence, ..)| *sequence);
    bets.into_iter()
        .map(|(_, player, bet)| (player, bet))
        .collect()
}
