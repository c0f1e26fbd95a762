//! Sender allocation planner
//!
//! Before a campaign starts, every send position is assigned a sender, once.
//! Targets are balanced across senders and domains (the remainder of
//! `recipients / senders` is handed out round-robin across domains), then
//! positions are filled by rotating through the pool while avoiding giving
//! the same sender two consecutive positions whenever any alternative still
//! has capacity.

use crate::prelude::*;
use coldpost_types::types::SenderIdentity;

/// Per-sender slice of the plan
#[derive(Debug, Clone)]
pub struct SenderPlan {
	pub address: Box<str>,
	pub domain: Box<str>,
	pub target_count: u32,
	pub current_count: u32,
}

/// Precomputed mapping from send position to sender
#[derive(Debug, Clone)]
pub struct AllocationPlan {
	pub senders: Vec<SenderPlan>,
	/// One entry per recipient position, indexing into the sender list
	pub sequence: Vec<usize>,
	/// Positions that had to reuse the previous position's sender because
	/// all remaining capacity belonged to it
	pub forced_consecutive: u32,
}

impl AllocationPlan {
	/// Build the plan for `recipient_count` positions over `senders`.
	/// Fails when the sender pool is empty.
	pub fn build(recipient_count: usize, senders: &[SenderIdentity]) -> CpResult<Self> {
		if senders.is_empty() {
			return Err(Error::ValidationError("no senders available".into()));
		}

		let mut plans: Vec<SenderPlan> = senders
			.iter()
			.map(|s| SenderPlan {
				address: s.address.clone(),
				domain: s.domain.clone(),
				target_count: (recipient_count / senders.len()) as u32,
				current_count: 0,
			})
			.collect();

		// Hand the remainder out round-robin across domains so no single
		// domain absorbs all the extra volume.
		let remainder = recipient_count % senders.len();
		for index in domain_interleaved_order(&plans).into_iter().take(remainder) {
			plans[index].target_count += 1;
		}

		let mut sequence: Vec<usize> = Vec::with_capacity(recipient_count);
		let mut forced_consecutive = 0u32;
		let mut cursor = 0usize;

		for position in 0..recipient_count {
			let last: Option<Box<str>> = sequence.last().map(|&i| plans[i].address.clone());

			// First pass: capacity left and different from the previous sender
			let mut selected = None;
			for attempt in 0..plans.len() {
				let index = (cursor + attempt) % plans.len();
				let plan = &plans[index];
				if plan.current_count < plan.target_count
					&& last.as_deref() != Some(plan.address.as_ref())
				{
					selected = Some(index);
					cursor = index;
					break;
				}
			}

			// Second pass: relax the distinct-sender constraint
			if selected.is_none() {
				for (index, plan) in plans.iter().enumerate() {
					if plan.current_count < plan.target_count {
						if last.as_deref() == Some(plan.address.as_ref()) {
							warn!(
								"forced consecutive sender {} at position {}",
								plan.address, position
							);
							forced_consecutive += 1;
						}
						selected = Some(index);
						cursor = index;
						break;
					}
				}
			}

			// Final fallback: everything at capacity, plain round-robin.
			// Unreachable while the target invariant holds.
			let index = match selected {
				Some(index) => index,
				None => {
					warn!("allocation fallback to round-robin at position {}", position);
					position % plans.len()
				}
			};

			plans[index].current_count += 1;
			sequence.push(index);
			cursor = (cursor + 1) % plans.len();
		}

		debug!(
			"allocation plan: {} positions over {} senders, {} forced consecutive",
			recipient_count,
			plans.len(),
			forced_consecutive
		);

		Ok(Self { senders: plans, sequence, forced_consecutive })
	}

	/// Sender index assigned to a position
	pub fn sender_at(&self, position: usize) -> usize {
		self.sequence.get(position).copied().unwrap_or(position % self.senders.len().max(1))
	}

	/// Number of adjacent positions sharing a sender (diagnostics)
	pub fn consecutive_pairs(&self) -> usize {
		self.sequence.windows(2).filter(|w| w[0] == w[1]).count()
	}
}

/// Sender indices reordered so consecutive entries cycle through domains:
/// first sender of each domain, then second of each, and so on.
fn domain_interleaved_order(plans: &[SenderPlan]) -> Vec<usize> {
	let mut domains: Vec<(&str, Vec<usize>)> = Vec::new();
	for (index, plan) in plans.iter().enumerate() {
		match domains.iter_mut().find(|(domain, _)| *domain == plan.domain.as_ref()) {
			Some((_, members)) => members.push(index),
			None => domains.push((plan.domain.as_ref(), vec![index])),
		}
	}

	let mut order = Vec::with_capacity(plans.len());
	let mut round = 0;
	while order.len() < plans.len() {
		for (_, members) in &domains {
			if let Some(&index) = members.get(round) {
				order.push(index);
			}
		}
		round += 1;
	}
	order
}


// vim: ts=4
