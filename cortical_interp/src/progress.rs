/////////////////////////////////////////////////////////////////////////////////////////////
//
// Defines progress reporting messages, sinks, and helper functions for rebuild passes.
//
// Created on: 20 Jul 2026     Author: Daniel Owen
//
// Copyright (c) 2026, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! Progress reporting primitives for interpolation rebuilds.

use std::sync::{Arc, mpsc};
use std::thread;
use std::fmt::Debug;

/// Progress events emitted while rebuilding the interpolation operator.
#[derive(Debug, Clone)]
pub enum ProgressMsg {
    /// Event indicating that a configuration update was rejected and the
    /// previous configuration kept.
    ConfigRejected { reason: String },

    /// Event indicating that a geodesic distance solve finished.
    DistanceSolveFinished {
        num_sources: usize,
        num_finite_pairs: usize,
    },

    /// Event indicating that an operator build finished and was published.
    OperatorPublished {
        num_rows: usize,
        num_nonzero: usize,
        num_empty_rows: usize,
    },

    /// Event indicating that a finished rebuild was discarded because the
    /// configuration changed while it was running.
    StaleResultDiscarded { generation: u64 },

    /// Arbitrary informational message.
    Message { message: String },
}

/// Sink that consumes progress messages.
pub trait ProgressSink: Send + Sync + Debug {
    fn emit(&self, msg: ProgressMsg);
}

/// Progress sink that forwards messages over a channel.
#[derive(Debug)]
pub struct ClosureSink {
    tx: mpsc::SyncSender<ProgressMsg>,
}

impl ProgressSink for ClosureSink {
    #[inline]
    fn emit(&self, msg: ProgressMsg) {
        let _ = self.tx.try_send(msg);
    }
}

/// Spawns a listener thread that runs a handler closure for each progress message.
pub fn closure_sink<F>(
    buffer: usize,
    mut handler: F,
) -> (Arc<dyn ProgressSink>, thread::JoinHandle<()>)
where
    F: FnMut(ProgressMsg) + Send + 'static,
{
    let (tx, rx) = mpsc::sync_channel::<ProgressMsg>(buffer.max(1));
    let sink: Arc<dyn ProgressSink> = Arc::new(ClosureSink { tx });

    let handle = thread::spawn(move || {
        while let Ok(msg) = rx.recv() {
            handler(msg);
        }
    });

    (sink, handle)
}
