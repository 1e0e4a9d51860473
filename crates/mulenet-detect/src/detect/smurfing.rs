//! Fan-in and fan-out ("smurfing") detection.
//!
//! One account collecting from, or paying out to, many distinct
//! counterparties is a smurfing hub. The score grows with the number of
//! counterparties (capped at 50) and with how tightly the transfers cluster
//! in time.

#![allow(clippy::cast_precision_loss)]

use std::collections::BTreeSet;

use mulenet_core::round::round_score;
use petgraph::Direction;
use petgraph::graph::NodeIndex;
use tracing::{debug, instrument};

use crate::context::{MAX_SCORE, Pattern, PatternType, Ring, RunContext};
use crate::detect::Detector;
use crate::detect::temporal::temporal_concentration;
use crate::error::DetectError;

/// Distinct counterparties needed before an account is considered.
pub const MIN_COUNTERPARTIES: usize = 10;
/// Counterparties beyond this add nothing to the score.
pub const COUNTERPARTY_CAP: usize = 50;
/// Smallest ring registered.
const MIN_MEMBERS: usize = 3;
/// Concentration above which members also get `high_velocity`.
const VELOCITY_CONCENTRATION: f64 = 0.5;
/// Share of the ring score spread across a member's flags.
const MEMBER_SHARE: f64 = 0.7;

/// Which side of an account the detector inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowDirection {
    /// Many senders into one account.
    Incoming,
    /// One account out to many receivers.
    Outgoing,
}

impl FlowDirection {
    const fn pattern(self) -> Pattern {
        match self {
            Self::Incoming => Pattern::FanIn,
            Self::Outgoing => Pattern::FanOut,
        }
    }

    const fn edges(self) -> Direction {
        match self {
            Self::Incoming => Direction::Incoming,
            Self::Outgoing => Direction::Outgoing,
        }
    }
}

/// Registers `smurfing` rings for one flow direction.
///
/// The engine runs it twice: fan-in over every account, then fan-out.
#[derive(Debug, Clone, Copy)]
pub struct SmurfingDetector {
    direction: FlowDirection,
}

impl SmurfingDetector {
    #[must_use]
    pub const fn fan_in() -> Self {
        Self {
            direction: FlowDirection::Incoming,
        }
    }

    #[must_use]
    pub const fn fan_out() -> Self {
        Self {
            direction: FlowDirection::Outgoing,
        }
    }

    #[must_use]
    pub const fn direction(&self) -> FlowDirection {
        self.direction
    }

    fn counterparties<'a>(&self, ctx: &RunContext<'a>, idx: NodeIndex) -> &'a BTreeSet<String> {
        let node = ctx.graph().account(idx);
        match self.direction {
            FlowDirection::Incoming => &node.senders,
            FlowDirection::Outgoing => &node.receivers,
        }
    }

    fn inspect(&self, ctx: &mut RunContext<'_>, idx: NodeIndex) -> bool {
        let graph = ctx.graph();
        let counterparties = self.counterparties(ctx, idx);
        if counterparties.len() < MIN_COUNTERPARTIES {
            return false;
        }

        let timestamps: Vec<_> = graph
            .flows(idx, self.direction.edges())
            .flat_map(|flow| flow.timestamps.iter().copied())
            .collect();
        let concentration = temporal_concentration(&timestamps);
        let base = smurfing_base(counterparties.len(), concentration);

        // The id is taken even when the ring ends up too small.
        let ring_id = ctx.next_ring_id();

        let account_id = graph.id(idx);
        let member_accounts: Vec<String> = std::iter::once(account_id)
            .chain(
                counterparties
                    .iter()
                    .map(String::as_str)
                    .filter(|&id| id != account_id),
            )
            .filter(|&id| !ctx.hubs().is_hub_id(id))
            .map(str::to_string)
            .collect();
        if member_accounts.len() < MIN_MEMBERS {
            return false;
        }

        let mut patterns = vec![self.direction.pattern()];
        if concentration > VELOCITY_CONCENTRATION {
            patterns.push(Pattern::HighVelocity);
        }
        let share = base * MEMBER_SHARE / patterns.len() as f64;
        for account in &member_accounts {
            for &pattern in &patterns {
                ctx.flag(account, pattern, &ring_id, share);
            }
        }

        ctx.push_ring(Ring {
            ring_id,
            member_accounts,
            pattern_type: PatternType::Smurfing,
            risk_score: round_score(base.min(MAX_SCORE)),
        });
        true
    }
}

impl Detector for SmurfingDetector {
    fn name(&self) -> &'static str {
        match self.direction {
            FlowDirection::Incoming => "fan_in",
            FlowDirection::Outgoing => "fan_out",
        }
    }

    #[instrument(skip_all, name = "detect_smurfing", fields(direction = ?self.direction))]
    fn detect(&self, ctx: &mut RunContext<'_>) -> Result<(), DetectError> {
        let graph = ctx.graph();
        let mut registered = 0usize;

        for idx in graph.nodes() {
            if ctx.is_hub(idx) {
                continue;
            }
            if self.inspect(ctx, idx) {
                registered += 1;
            }
        }

        debug!(rings = registered, "smurfing detection finished");
        Ok(())
    }
}

/// Unrounded ring score: 35, plus 0.6 per counterparty up to 50, plus up to
/// 15 for temporal concentration.
#[must_use]
pub fn smurfing_base(counterparties: usize, concentration: f64) -> f64 {
    35.0 + counterparties.min(COUNTERPARTY_CAP) as f64 * 0.6 + concentration * 15.0
}
