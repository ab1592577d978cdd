// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! A rolling record of corrected per-second statistics, used to find
//! interference that is only visible over many seconds.

use std::collections::VecDeque;

use crate::constants::HISTORY_SIZE;

/// The corrected statistics of one polarisation for one second.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    /// The second this entry was recorded in.
    pub second: usize,
    pub mean: f32,
    pub median: f32,
    pub std_dev: f32,
    /// Per-channel power, with flagged channels replaced.
    pub powers: Vec<f32>,
}

/// Per-polarisation ring buffers of [`HistoryEntry`]s for one stream (e.g. a
/// subband of a baseline). The buffers hold at most `capacity` seconds; the
/// oldest second is dropped to make room.
///
/// All polarisations share a second counter. [`FlaggerHistory::advance`] is
/// called once per second (when polarisation 0 is seen), so the buffers of
/// every polarisation stay aligned in time.
#[derive(Debug, Clone)]
pub struct FlaggerHistory {
    capacity: usize,
    /// `None` until the first second starts.
    current_second: Option<usize>,
    polarisations: Vec<VecDeque<HistoryEntry>>,
}

impl Default for FlaggerHistory {
    fn default() -> Self {
        Self::new(HISTORY_SIZE)
    }
}

impl FlaggerHistory {
    /// # Panics
    ///
    /// Panics if `capacity` is 0.
    pub fn new(capacity: usize) -> FlaggerHistory {
        assert!(capacity > 0, "a history needs room for at least one second");
        FlaggerHistory {
            capacity,
            current_second: None,
            polarisations: vec![],
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Start a new second.
    pub fn advance(&mut self) {
        self.current_second = Some(self.current_second.map_or(0, |s| s + 1));
    }

    /// The second currently being processed, if any has started.
    pub fn current_second(&self) -> Option<usize> {
        self.current_second
    }

    /// The number of seconds recorded for `pol`.
    pub fn len(&self, pol: usize) -> usize {
        self.polarisations.get(pol).map_or(0, VecDeque::len)
    }

    pub fn is_empty(&self, pol: usize) -> bool {
        self.len(pol) == 0
    }

    /// Record statistics for `pol` in the current second. Recording twice in
    /// the same second replaces the earlier entry.
    pub fn add(&mut self, pol: usize, mean: f32, median: f32, std_dev: f32, powers: Vec<f32>) {
        let second = self.current_second.unwrap_or(0);
        if self.polarisations.len() <= pol {
            self.polarisations.resize_with(pol + 1, VecDeque::new);
        }
        let ring = &mut self.polarisations[pol];

        let entry = HistoryEntry {
            second,
            mean,
            median,
            std_dev,
            powers,
        };
        match ring.back_mut() {
            Some(last) if last.second == second => *last = entry,
            _ => {
                if ring.len() == self.capacity {
                    ring.pop_front();
                }
                ring.push_back(entry);
            }
        }
    }

    pub fn entries(&self, pol: usize) -> impl Iterator<Item = &HistoryEntry> {
        self.polarisations.get(pol).into_iter().flatten()
    }

    /// The mean of the recorded medians of `pol`, or `None` if nothing has
    /// been recorded.
    pub fn mean_median(&self, pol: usize) -> Option<f32> {
        let n = self.len(pol);
        if n == 0 {
            return None;
        }
        let sum: f64 = self.entries(pol).map(|e| f64::from(e.median)).sum();
        Some((sum / n as f64) as f32)
    }

    /// The (population) standard deviation of the recorded medians of `pol`,
    /// or `None` if nothing has been recorded.
    pub fn std_dev_of_medians(&self, pol: usize) -> Option<f32> {
        let n = self.len(pol);
        let mean = f64::from(self.mean_median(pol)?);
        let sum_sq: f64 = self
            .entries(pol)
            .map(|e| {
                let d = f64::from(e.median) - mean;
                d * d
            })
            .sum();
        Some((sum_sq / n as f64).sqrt() as f32)
    }

    /// The recorded per-channel powers of `pol`, summed over all recorded
    /// seconds. Empty if nothing has been recorded.
    pub fn integrated_powers(&self, pol: usize) -> Vec<f32> {
        let mut entries = self.entries(pol);
        let Some(first) = entries.next() else {
            return vec![];
        };
        let mut sums: Vec<f64> = first.powers.iter().map(|&p| f64::from(p)).collect();
        for entry in entries {
            for (sum, &p) in sums.iter_mut().zip(&entry.powers) {
                *sum += f64::from(p);
            }
        }
        sums.into_iter().map(|s| s as f32).collect()
    }

    /// The recorded per-channel powers of `pol`, averaged over all recorded
    /// seconds.
    pub fn mean_powers(&self, pol: usize) -> Vec<f32> {
        let n = self.len(pol) as f32;
        self.integrated_powers(pol)
            .into_iter()
            .map(|p| p / n)
            .collect()
    }
}
