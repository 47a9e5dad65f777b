//! Binds [`AppService`] to concrete ports for the scheduler.
//!
//! `Device` owns every port the task bodies need and implements
//! [`SchedulerDelegate`], so the scheduler can dispatch a due task
//! without knowing about hardware, storage or the uplink.

use embedded_hal::delay::DelayNs;

use crate::error::Fault;
use crate::scheduler::TaskId;

use super::ports::{ActuatorPort, EventSink, SchedulerDelegate, SensorPort, StoragePort, UplinkPort};
use super::service::AppService;

pub struct Device<H, S, U, D, E> {
    service: AppService,
    hw: H,
    store: S,
    uplink: U,
    delay: D,
    sink: E,
}

impl<H, S, U, D, E> Device<H, S, U, D, E>
where
    H: SensorPort + ActuatorPort,
    S: StoragePort,
    U: UplinkPort,
    D: DelayNs,
    E: EventSink,
{
    pub fn new(service: AppService, hw: H, store: S, uplink: U, delay: D, sink: E) -> Self {
        Self {
            service,
            hw,
            store,
            uplink,
            delay,
            sink,
        }
    }

    /// Bring the uplink up once before the scheduler starts.
    pub fn connect_now(&mut self) {
        self.service.check_connectivity(&mut self.uplink);
    }

    pub fn service(&self) -> &AppService {
        &self.service
    }

    pub fn hw(&self) -> &H {
        &self.hw
    }

    pub fn hw_mut(&mut self) -> &mut H {
        &mut self.hw
    }

    pub fn uplink(&self) -> &U {
        &self.uplink
    }

    pub fn delay_mut(&mut self) -> &mut D {
        &mut self.delay
    }

    pub fn sink(&self) -> &E {
        &self.sink
    }
}

impl<H, S, U, D, E> SchedulerDelegate for Device<H, S, U, D, E>
where
    H: SensorPort + ActuatorPort,
    S: StoragePort,
    U: UplinkPort,
    D: DelayNs,
    E: EventSink,
{
    fn on_task_due(&mut self, task: TaskId, now: u32) -> Result<(), Fault> {
        match task {
            TaskId::RuntimePersist => {
                self.service.persist_uptime(&mut self.store, &mut self.uplink);
                Ok(())
            }
            TaskId::ConnectivityCheck => {
                self.service.check_connectivity(&mut self.uplink);
                Ok(())
            }
            TaskId::DataPublish => {
                self.service.publish_data(&mut self.uplink, &mut self.sink);
                Ok(())
            }
            TaskId::Sampling => self.service.sample_and_actuate(
                now,
                &mut self.hw,
                &mut self.delay,
                &mut self.store,
                &mut self.uplink,
                &mut self.sink,
            ),
        }
    }
}
