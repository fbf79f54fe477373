use std::thread;
use std::time::Duration;

use crate::models::audio_models::EndpointInfo;
use crate::models::error::ReplayError;
use crate::traits::endpoint::{CaptureSource, RenderSink};

/// Probe both endpoints until each has answered once, up to `attempts` rounds.
///
/// An endpoint that already succeeded is not probed again. If either one is
/// still missing after the last round, every failure from every round is
/// returned in one `DeviceUnavailable`.
pub fn probe_endpoints<C: CaptureSource + ?Sized, R: RenderSink + ?Sized>(
    source: &mut C,
    sink: &mut R,
    attempts: u32,
    interval: Duration,
) -> Result<(EndpointInfo, EndpointInfo), ReplayError> {
    let mut capture = None;
    let mut render = None;
    let mut failures = Vec::new();

    for attempt in 1..=attempts {
        if capture.is_none() {
            match source.probe() {
                Ok(info) => {
                    log::info!("Capture endpoint ready: {}", info.name);
                    capture = Some(info);
                }
                Err(e) => {
                    log::warn!("Capture probe {} of {} failed: {}", attempt, attempts, e);
                    failures.push(format!("attempt {} capture: {}", attempt, e));
                }
            }
        }
        if render.is_none() {
            match sink.probe() {
                Ok(info) => {
                    log::info!("Render endpoint ready: {}", info.name);
                    render = Some(info);
                }
                Err(e) => {
                    log::warn!("Render probe {} of {} failed: {}", attempt, attempts, e);
                    failures.push(format!("attempt {} render: {}", attempt, e));
                }
            }
        }

        if let (Some(c), Some(r)) = (&capture, &render) {
            return Ok((c.clone(), r.clone()));
        }
        if attempt < attempts {
            thread::sleep(interval);
        }
    }

    log::error!("No usable audio endpoints after {} attempts", attempts);
    Err(ReplayError::DeviceUnavailable(failures))
}
