// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Exclusive leasing of compute devices.
//!
//! The pool is sized by its probe on first use. Leases are handed out under
//! the pool mutex and callers block on a condition variable while every
//! device is busy. A [`DeviceLease`] returns its device when dropped, so a
//! lease held across `?` is released on the error path as well.
//!
//! Every allocation bumps the device's generation. A lease only frees the
//! device while its generation is current, so a lease whose device was
//! already returned through [`DevicePool::free`] and handed out again
//! cannot release it under the new holder.

use std::fmt;

use parking_lot::{Condvar, Mutex};
use tracing::{debug, info, warn};

use super::probe::{DeviceProbe, EnvProbe, FixedProbe};
use crate::config::DevicesConfig;
use crate::error::{DeviceError, Result};

/// Lease state of one device.
#[derive(Debug, Clone, Copy, Default)]
struct Slot {
    busy: bool,
    generation: u64,
}

/// A fixed set of compute devices shared between workers.
///
/// Usually shared through `Arc`.
pub struct DevicePool {
    probe: Box<dyn DeviceProbe>,
    /// One slot per device, `None` until the probe has run.
    slots: Mutex<Option<Vec<Slot>>>,
    released: Condvar,
}

impl DevicePool {
    /// Create a pool sized by `probe` on first use.
    pub fn new(probe: impl DeviceProbe + 'static) -> Self {
        Self {
            probe: Box::new(probe),
            slots: Mutex::new(None),
            released: Condvar::new(),
        }
    }

    /// Pool of exactly `count` devices.
    pub fn with_devices(count: usize) -> Self {
        Self::new(FixedProbe(count))
    }

    /// Pool sized by `devices.count`, or by the environment when unset.
    pub fn from_config(config: &DevicesConfig) -> Self {
        match config.count {
            Some(count) => Self::with_devices(count),
            None => Self::new(EnvProbe),
        }
    }

    /// Number of devices in the pool.
    pub fn size(&self) -> usize {
        let mut slots = self.slots.lock();
        self.table(&mut slots).len()
    }

    /// Number of devices currently leased.
    pub fn busy_count(&self) -> usize {
        let mut slots = self.slots.lock();
        self.table(&mut slots).iter().filter(|s| s.busy).count()
    }

    /// Lease a free device, blocking until one is available.
    pub fn allocate(&self) -> Result<DeviceLease<'_>> {
        let mut slots = self.slots.lock();
        if self.table(&mut slots).is_empty() {
            return Err(DeviceError::NoDevices.into());
        }

        loop {
            let all = self.table(&mut slots);
            if let Some(id) = all.iter().position(|s| !s.busy) {
                let slot = &mut all[id];
                slot.busy = true;
                slot.generation = slot.generation.wrapping_add(1);
                debug!(device = id, generation = slot.generation, "Leased device");
                return Ok(DeviceLease {
                    pool: self,
                    id,
                    generation: slot.generation,
                });
            }
            self.released.wait(&mut slots);
        }
    }

    /// Return device `id` to the pool, whichever lease holds it.
    pub fn free(&self, id: usize) -> Result<()> {
        self.release_slot(id, None)
    }

    /// Clear the busy flag of `id`. With `generation` set, the device is
    /// only freed while that generation is still current.
    fn release_slot(&self, id: usize, generation: Option<u64>) -> Result<()> {
        let mut slots = self.slots.lock();
        let all = self.table(&mut slots);
        let size = all.len();
        let slot = all
            .get_mut(id)
            .ok_or(DeviceError::UnknownDevice { id, size })?;
        if generation.is_some_and(|g| g != slot.generation) {
            return Err(DeviceError::StaleLease(id).into());
        }
        if !slot.busy {
            return Err(DeviceError::NotLeased(id).into());
        }
        slot.busy = false;
        debug!(device = id, "Released device");
        self.released.notify_one();
        Ok(())
    }

    fn table<'g>(&self, slots: &'g mut Option<Vec<Slot>>) -> &'g mut Vec<Slot> {
        slots.get_or_insert_with(|| {
            let count = match self.probe.probe() {
                Ok(count) => {
                    info!(probe = self.probe.name(), devices = count, "Device pool sized");
                    count
                }
                Err(e) => {
                    warn!(
                        probe = self.probe.name(),
                        error = %e,
                        "Device probe failed, pool is empty"
                    );
                    0
                }
            };
            vec![Slot::default(); count]
        })
    }
}

impl fmt::Debug for DevicePool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DevicePool")
            .field("probe", &self.probe.name())
            .field("slots", &*self.slots.lock())
            .finish()
    }
}

/// Exclusive hold on one device of a [`DevicePool`].
#[derive(Debug)]
#[must_use = "the device is released as soon as the lease is dropped"]
pub struct DeviceLease<'a> {
    pool: &'a DevicePool,
    id: usize,
    generation: u64,
}

impl DeviceLease<'_> {
    /// Id of the leased device.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Release the device now.
    ///
    /// Fails with `StaleLease` if the device was freed by id and leased
    /// again since this lease was taken.
    pub fn release(self) -> Result<()> {
        let (pool, id, generation) = (self.pool, self.id, self.generation);
        std::mem::forget(self);
        pool.release_slot(id, Some(generation))
    }

    /// Give up the guard and keep the device leased.
    ///
    /// The caller becomes responsible for [`DevicePool::free`].
    pub fn into_id(self) -> usize {
        let id = self.id;
        std::mem::forget(self);
        id
    }
}

impl Drop for DeviceLease<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.pool.release_slot(self.id, Some(self.generation)) {
            warn!(device = self.id, error = %e, "Failed to release device");
        }
    }
}
