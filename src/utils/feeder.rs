//! Push-one, pull-one adapter over a lazy batch resolver.
//!
//! A batch resolver is a function that takes an iterator of inputs and
//! returns an iterator of results, deciding itself how many inputs it pulls
//! before doing the expensive work (e.g. one controller round-trip for a
//! whole burst of ids). [`Feeder`] turns such a function into something
//! that is called with one input at a time and returns the matching result.
//!
//! The batch resolver is invoked exactly once, when the feeder is created,
//! with a [`Drain`] over a buffer owned by the feeder. Every call to
//! [`Feeder::push`] appends to that buffer and advances the resolver's
//! result iterator by one step. A `Drain` yields whatever is buffered at the
//! moment it is polled and reports `None` when the buffer is empty; it is
//! not fused, so the next poll after another push yields again.
//!
//! The buffer is shared through `Rc<RefCell<_>>`, so a feeder is neither
//! `Send` nor `Sync` and can only be driven from a single flow of control.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

/// The batch resolver stopped producing results while inputs were still owed
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("batch resolver exhausted: {owed} result(s) still owed after {answered} answered")]
pub struct ExhaustedResolverError {
    /// Results the current call was still waiting for, this one included
    pub owed: usize,
    /// Results produced over the feeder's lifetime
    pub answered: usize,
}

/// Error returned by [`Feeder::push`]
#[derive(Debug, thiserror::Error)]
pub enum FeedError<E> {
    /// Contract violation by the batch resolver
    #[error(transparent)]
    Exhausted(#[from] ExhaustedResolverError),
    /// Error produced by the batch resolver itself, passed through untouched
    #[error(transparent)]
    Batch(E),
}

type Pending<I> = Rc<RefCell<VecDeque<I>>>;

/// Non-blocking view over the feeder's pending buffer
pub struct Drain<I> {
    pending: Pending<I>,
}

impl<I> Iterator for Drain<I> {
    type Item = I;

    fn next(&mut self) -> Option<I> {
        self.pending.borrow_mut().pop_front()
    }
}

/// Single-item front end for a batch resolver
pub struct Feeder<I, S> {
    pending: Pending<I>,
    results: S,
    owed: usize,
    answered: usize,
}

impl<I, S, O, E> Feeder<I, S>
where
    S: Iterator<Item = Result<O, E>>,
{
    /// Build the feeder, invoking `batch` once to obtain the result stream.
    pub fn new<F>(batch: F) -> Self
    where
        F: FnOnce(Drain<I>) -> S,
    {
        let pending: Pending<I> = Rc::new(RefCell::new(VecDeque::new()));
        let results = batch(Drain {
            pending: Rc::clone(&pending),
        });

        Self {
            pending,
            results,
            owed: 0,
            answered: 0,
        }
    }

    /// Feed one item and return its result.
    pub fn push(&mut self, item: I) -> Result<O, FeedError<E>> {
        self.enqueue(std::iter::once(item));
        self.pull().map_err(|err| {
            self.resync();
            err
        })
    }

    /// Feed several items at once and return their results in order.
    ///
    /// All items are buffered before the first pull, so a resolver that
    /// drains the whole buffer handles them in a single batch. Stops at the
    /// first error; the rest of the batch is discarded so the next push
    /// still gets its own result.
    pub fn push_batch<T>(&mut self, items: T) -> Result<Vec<O>, FeedError<E>>
    where
        T: IntoIterator<Item = I>,
    {
        let count = self.enqueue(items);
        let mut results = Vec::with_capacity(count);
        for _ in 0..count {
            match self.pull() {
                Ok(result) => results.push(result),
                Err(err) => {
                    self.resync();
                    return Err(err);
                }
            }
        }
        Ok(results)
    }

    /// Items buffered but not yet drained by the resolver
    pub fn pending(&self) -> usize {
        self.pending.borrow().len()
    }

    fn enqueue<T>(&mut self, items: T) -> usize
    where
        T: IntoIterator<Item = I>,
    {
        let mut pending = self.pending.borrow_mut();
        let before = pending.len();
        pending.extend(items);
        let count = pending.len() - before;
        self.owed += count;
        count
    }

    fn pull(&mut self) -> Result<O, FeedError<E>> {
        // The RefCell is not borrowed here; the resolver borrows it through Drain
        let next = self.results.next();
        let owed = self.owed;
        self.owed = owed.saturating_sub(1);
        match next {
            Some(Ok(result)) => {
                self.answered += 1;
                Ok(result)
            }
            Some(Err(err)) => {
                self.answered += 1;
                Err(FeedError::Batch(err))
            }
            None => Err(ExhaustedResolverError {
                owed,
                answered: self.answered,
            }
            .into()),
        }
    }

    /// Forget everything owed by an aborted call.
    ///
    /// Ids never drained are dropped from the buffer, then results the
    /// resolver already holds for drained ids are pulled and discarded.
    fn resync(&mut self) {
        let undrained = {
            let mut pending = self.pending.borrow_mut();
            let undrained = pending.len();
            pending.clear();
            undrained
        };
        self.owed = self.owed.saturating_sub(undrained);

        while self.owed > 0 {
            if self.results.next().is_none() {
                break;
            }
            self.owed -= 1;
        }
        self.owed = 0;
    }
}
