//! One-shot completion handle for a pending pick.
//!
//! A [`Completion`] is settled by value: [`resolve`](Completion::resolve) and
//! [`reject`](Completion::reject) consume it, so a pick can be settled at most
//! once. Two backings exist:
//!
//! - [`Completion::channel`] pairs the handle with a [`PickFuture`] for async callers
//! - [`Completion::from_fn`] invokes a callback, the shape a promise bridge expects
//!
//! Dropping an unsettled channel completion wakes its future with
//! [`Error::Orphaned`]; an unsettled callback completion is never invoked.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use picker_protocol::PickResult;
use tokio::sync::oneshot;

use crate::error::{Error, Result};

/// Settled value of a pick.
pub type Outcome = Result<PickResult>;

type Callback = Box<dyn FnOnce(Outcome) + Send + 'static>;

enum Settle {
	Channel(oneshot::Sender<Outcome>),
	Callback(Callback),
}

/// Handle capable of exactly one resolve-or-reject.
pub struct Completion {
	settle: Settle,
}

impl Completion {
	/// Creates a completion whose outcome is delivered to the returned future.
	pub fn channel() -> (Self, PickFuture) {
		let (tx, rx) = oneshot::channel();
		(
			Self {
				settle: Settle::Channel(tx),
			},
			PickFuture { rx },
		)
	}

	/// Creates a completion that calls `f` with the outcome.
	pub fn from_fn<F>(f: F) -> Self
	where
		F: FnOnce(Outcome) + Send + 'static,
	{
		Self {
			settle: Settle::Callback(Box::new(f)),
		}
	}

	pub fn resolve(self, result: PickResult) {
		self.settle(Ok(result));
	}

	pub fn reject(self, error: Error) {
		self.settle(Err(error));
	}

	/// Returns true if nobody is listening for the outcome any more.
	///
	/// Always false for callback completions.
	pub fn is_closed(&self) -> bool {
		match &self.settle {
			Settle::Channel(tx) => tx.is_closed(),
			Settle::Callback(_) => false,
		}
	}

	fn settle(self, outcome: Outcome) {
		match self.settle {
			Settle::Channel(tx) => {
				if tx.send(outcome).is_err() {
					tracing::debug!("Pick settled after its caller stopped waiting");
				}
			}
			Settle::Callback(f) => f(outcome),
		}
	}
}

impl fmt::Debug for Completion {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let kind = match self.settle {
			Settle::Channel(_) => "channel",
			Settle::Callback(_) => "callback",
		};
		f.debug_struct("Completion").field("kind", &kind).finish()
	}
}

/// Future returned alongside a channel [`Completion`].
#[derive(Debug)]
pub struct PickFuture {
	rx: oneshot::Receiver<Outcome>,
}

impl Future for PickFuture {
	type Output = Outcome;

	fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
		Pin::new(&mut self.rx)
			.poll(cx)
			.map(|result| result.map_err(|_| Error::Orphaned).and_then(|r| r))
	}
}
