//! Link supervision task
//!
//! Runs the connectivity supervisor against the coprocessor. Retries,
//! pings and provisioning all happen here; the display never waits on it.

use cortex_m::peripheral::SCB;
use defmt::*;
use embassy_futures::select::{select, Either};
use embassy_time::{Duration, Timer};

use marquee_core::config::Settings;
use marquee_core::link::{LinkDriver, LinkState, Outcome, Supervisor, TIME_UNIT_MS};
use marquee_hal_rp2040::Rp2040FlashStorage;

use crate::channels::{RECONFIGURE, STATUS};
use crate::config::{log_settings_summary, ConfigPersistence};
use crate::config::ConfigError;
use crate::link::{CoprocessorLink, EmbassyClock};

/// Delay between a portal timeout and the reset, so the log gets out
const RESET_DELAY: Duration = Duration::from_millis(3000);

#[embassy_executor::task]
pub async fn link_task(
    link: CoprocessorLink,
    persistence: ConfigPersistence<Rp2040FlashStorage<'static>>,
    settings: Settings,
) {
    info!("Link task started");

    let mut persistence = persistence;
    let mut settings = settings;
    let mut supervisor = Supervisor::new(settings.link.link_config());
    let mut driver = LinkDriver::new(link, EmbassyClock);

    if let Err(e) = driver.transport_mut().configure(&settings.broker).await {
        warn!("Failed to send broker settings: {:?}", e);
    }

    loop {
        let retries = supervisor.retries();

        match driver.service(&mut supervisor, &RECONFIGURE).await {
            Outcome::Idle => {
                // Sleep one time unit unless the operator asks for the portal
                let nap = Timer::after(Duration::from_millis(TIME_UNIT_MS as u64));
                if let Either::Second(()) = select(nap, RECONFIGURE.wait()).await {
                    info!("Manual reconfiguration trigger");
                    // Re-arm so the driver tears the session down itself
                    RECONFIGURE.signal(());
                }
            }
            Outcome::Changed(t) => {
                info!("Link {:?} -> {:?}", t.from, t.to);
            }
            Outcome::NeedsReconfiguration => {
                warn!("Link needs reconfiguration, opening portal");
                STATUS.set_link(LinkState::Reconfiguring, 0);
                reconfigure(&mut driver, &mut persistence, &mut settings).await;
                driver.restart(&mut supervisor, settings.link.link_config(), &RECONFIGURE);
                info!("Supervisor restarted");
            }
            Outcome::Fatal(code) => {
                STATUS.set_link(LinkState::Faulted, 0);
                error!(
                    "Fatal transport error {=u8:#x}; link parked until reset",
                    code
                );
                // The display keeps scrolling; nothing here can recover
                loop {
                    Timer::after_secs(3600).await;
                }
            }
        }

        if supervisor.retries() > retries {
            if let Some(e) = supervisor.last_error() {
                warn!(
                    "Connect attempt failed: {:?} ({}/{})",
                    e,
                    supervisor.retries(),
                    supervisor.config().retry_ceiling()
                );
            }
        }
        STATUS.set_link(supervisor.state(), supervisor.retries());
    }
}

async fn reconfigure(
    driver: &mut LinkDriver<CoprocessorLink, EmbassyClock>,
    persistence: &mut ConfigPersistence<Rp2040FlashStorage<'static>>,
    settings: &mut Settings,
) {
    let link = driver.transport_mut();

    match link.run_portal(&settings.portal, &settings.broker).await {
        Ok(broker) => {
            info!("Portal completed");
            settings.broker = broker;
            if let Err(e) = persistence.save(settings).await {
                error!("Failed to save settings: {:?}", e);
            }
            log_settings_summary(settings);
            link.set_timeouts(&settings.link);
            if let Err(e) = link.configure(&settings.broker).await {
                warn!("Failed to send broker settings: {:?}", e);
            }
        }
        Err(ConfigError::Timeout) => {
            warn!("Portal timed out, restarting");
            Timer::after(RESET_DELAY).await;
            SCB::sys_reset();
        }
        Err(e) => {
            error!("Portal failed: {:?}, restarting", e);
            Timer::after(RESET_DELAY).await;
            SCB::sys_reset();
        }
    }
}
