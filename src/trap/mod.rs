// Copyright 2024 FastLabs Developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Receive errors raised inside the pipeline.
//!
//! A failing sink cannot report through the pipeline it belongs to, so its errors are handed to a
//! [`Trap`] instead.

use std::fmt;

use crate::Error;

mod default;

pub use self::default::DefaultTrap;

/// A trap that receives errors which occur while dispatching records.
pub trait Trap: fmt::Debug + Send + Sync + 'static {
    /// Handle an error.
    fn trap(&self, err: &Error);
}

impl<T: Trap> From<T> for Box<dyn Trap> {
    fn from(value: T) -> Self {
        Box::new(value)
    }
}

/// A trap that swallows every error.
///
/// Failures are still counted by the [`Dispatcher`](crate::Dispatcher).
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTrap;

impl Trap for NoopTrap {
    fn trap(&self, _: &Error) {}
}
