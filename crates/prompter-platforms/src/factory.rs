use prompter_schema::{Platform, PlatformConfig, RelayError};

use crate::meet::MeetIntegration;
use crate::slack::SlackIntegration;
use crate::teams::TeamsIntegration;
use crate::zoom::ZoomIntegration;
use crate::PlatformIntegration;

/// Build the integration for a platform tag, connecting immediately when the
/// config carries a meeting link. Without one the instance comes back
/// unconnected, which is enough for capability probing.
pub async fn create_platform_integration(
    platform: &str,
    config: &PlatformConfig,
) -> Result<Box<dyn PlatformIntegration>, RelayError> {
    let platform: Platform = platform.parse()?;
    let mut integration = new_integration(platform);

    if config.meeting_link.is_some() {
        integration
            .connect(config)
            .await
            .map_err(|e| RelayError::PlatformIntegrationFailed(Box::new(e)))?;
    }

    Ok(integration)
}

pub fn new_integration(platform: Platform) -> Box<dyn PlatformIntegration> {
    match platform {
        Platform::Zoom => Box::new(ZoomIntegration::new()),
        Platform::Meet => Box::new(MeetIntegration::new()),
        Platform::Teams => Box::new(TeamsIntegration::new()),
        Platform::Slack => Box::new(SlackIntegration::new()),
    }
}
