//! Session reporting to the companion backend.
//!
//! [`BackendClient`] speaks the wire format; [`SessionReporter`] applies the
//! error policy: a backend that is down must never interrupt a local
//! monitoring session, so every reporting failure is logged and swallowed.

pub mod client;

use log::{debug, info, warn};

pub use client::{BackendClient, PostureLog, ReportError, SessionSummary};

use crate::config::BackendConfig;
use crate::posture::{PostureStatus, SessionStats};
use crate::pose::AngleSample;

// ---------------------------------------------------------------------------
// SessionReporter
// ---------------------------------------------------------------------------

/// Per-session reporting wrapper.  Holds the backend-assigned session id
/// once `begin` succeeds; all methods are infallible from the caller's
/// perspective.
pub struct SessionReporter {
    client: Option<BackendClient>,
    session_id: Option<String>,
}

impl SessionReporter {
    /// Build a reporter; a disabled backend yields an inert reporter.
    pub fn from_config(config: &BackendConfig) -> Self {
        let client = config.enabled.then(|| BackendClient::from_config(config));
        if client.is_none() {
            debug!("report: backend disabled, session will not be reported");
        }
        Self {
            client,
            session_id: None,
        }
    }

    /// Open a backend session.  On failure the session simply stays local.
    pub async fn begin(&mut self) {
        let Some(client) = &self.client else { return };
        match client.start_session().await {
            Ok(id) => {
                info!("report: backend session {id} started");
                self.session_id = Some(id);
            }
            Err(e) => warn!("report: could not start backend session (continuing locally): {e}"),
        }
    }

    /// Log one periodic posture record.
    pub async fn log(
        &self,
        sample: &AngleSample,
        status: PostureStatus,
        feedback: &str,
        was_corrected: bool,
        duration_seconds: u64,
    ) {
        let (Some(client), Some(session_id)) = (&self.client, &self.session_id) else {
            return;
        };

        let issues = match status {
            PostureStatus::Good => vec![],
            PostureStatus::Degrading => vec!["slouching".to_string()],
            PostureStatus::Bad => vec!["severe_slouch".to_string()],
        };

        let log = PostureLog {
            session_id: session_id.clone(),
            posture_status: status.as_log_str().to_string(),
            left_angle: sample.left,
            right_angle: sample.right,
            total_angle: sample.total,
            issues,
            feedback: Some(feedback.to_string()),
            was_corrected,
            duration_seconds,
        };

        if let Err(e) = client.log_posture(&log).await {
            warn!("report: posture log failed (ignored): {e}");
        }
    }

    /// Close the backend session with final totals.
    pub async fn finish(&mut self, stats: &SessionStats) {
        let (Some(client), Some(session_id)) = (&self.client, self.session_id.take()) else {
            return;
        };

        let summary = SessionSummary {
            session_id,
            total_duration: stats.elapsed_secs,
            good_posture_percentage: stats.good_percentage(),
            total_corrections: stats.bad_transitions,
        };

        if let Err(e) = client.end_session(&summary).await {
            warn!("report: session end failed (ignored): {e}");
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn disabled_config() -> BackendConfig {
        BackendConfig {
            enabled: false,
            ..BackendConfig::default()
        }
    }

    #[tokio::test]
    async fn disabled_reporter_is_inert() {
        let mut reporter = SessionReporter::from_config(&disabled_config());
        reporter.begin().await;
        assert!(reporter.session_id.is_none());

        // All calls are no-ops and must not panic.
        reporter
            .log(
                &AngleSample::combined(75.0),
                PostureStatus::Degrading,
                "msg",
                false,
                300,
            )
            .await;
        reporter
            .finish(&SessionStats {
                good_frames: 1,
                total_frames: 2,
                bad_transitions: 0,
                elapsed_secs: 10,
            })
            .await;
    }

    #[tokio::test]
    async fn unreachable_backend_is_swallowed() {
        // Port 9 (discard) — connection refused without a long timeout.
        let config = BackendConfig {
            enabled: true,
            base_url: "http://127.0.0.1:9".into(),
            user_id: "user_001".into(),
            timeout_secs: 1,
        };

        let mut reporter = SessionReporter::from_config(&config);
        reporter.begin().await;
        // Failure leaves the reporter without a session id; later calls are
        // no-ops rather than errors.
        assert!(reporter.session_id.is_none());
    }
}
