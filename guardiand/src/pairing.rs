use crate::config::PairingConfig;
use log::info;
use rand::Rng;
use std::time::Duration;

pub const DEVICE_PREFIX: &str = "FitBand-";
const DEVICE_SUFFIX_LEN: usize = 9;
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Simulated wearable pairing: a short search, then a fresh device id.
#[derive(Debug, Clone)]
pub struct DevicePairer {
    delay: Duration,
}

impl DevicePairer {
    pub fn new(cfg: &PairingConfig) -> Self {
        Self {
            delay: Duration::from_millis(cfg.delay_ms),
        }
    }

    pub async fn pair(&self) -> String {
        info!("[pairing] searching for devices");
        tokio::time::sleep(self.delay).await;
        let device_id = generate_device_id(&mut rand::thread_rng());
        info!("[pairing] paired {device_id}");
        device_id
    }
}

pub fn generate_device_id<R: Rng + ?Sized>(rng: &mut R) -> String {
    let suffix: String = (0..DEVICE_SUFFIX_LEN)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();
    format!("{DEVICE_PREFIX}{suffix}")
}
