// SPDX-FileCopyrightText: 2026 Sitekit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Builds the configured channel chain and notifier.

use std::sync::Arc;
use std::time::Duration;

use sitekit_config::SitekitConfig;
use sitekit_core::{ChannelKind, DeliveryChannel, SitekitError};
use tracing::debug;

use crate::channels::{
    build_http_client, EmailJsChannel, FormspreeChannel, GoogleSheetsChannel, LinkLauncher,
    TelegramChannel, Web3FormsChannel, WhatsAppChannel,
};

/// Channels in priority order plus the optional notifier.
pub struct ChannelSet {
    pub chain: Vec<Arc<dyn DeliveryChannel>>,
    pub notifier: Option<Arc<dyn DeliveryChannel>>,
}

/// Instantiate one built-in channel from configuration.
pub fn build_channel(
    kind: ChannelKind,
    config: &SitekitConfig,
    client: &reqwest::Client,
    launcher: &Arc<dyn LinkLauncher>,
) -> Result<Arc<dyn DeliveryChannel>, SitekitError> {
    let site = &config.site;
    let channel: Arc<dyn DeliveryChannel> = match kind {
        ChannelKind::Web3forms => Arc::new(Web3FormsChannel::new(
            &config.web3forms,
            site,
            client.clone(),
        )?),
        ChannelKind::Emailjs => {
            Arc::new(EmailJsChannel::new(&config.emailjs, site, client.clone())?)
        }
        ChannelKind::Formspree => Arc::new(FormspreeChannel::new(&config.formspree, client.clone())?),
        ChannelKind::Telegram => {
            Arc::new(TelegramChannel::new(&config.telegram, site, client.clone())?)
        }
        ChannelKind::GoogleSheets => Arc::new(GoogleSheetsChannel::new(
            &config.google_sheets,
            client.clone(),
        )?),
        ChannelKind::Whatsapp => Arc::new(WhatsAppChannel::new(
            &config.whatsapp,
            site,
            Arc::clone(launcher),
        )?),
    };
    Ok(channel)
}

/// Build `leads.channels` in order, and `leads.notify` if set.
pub fn build_channels(
    config: &SitekitConfig,
    launcher: Arc<dyn LinkLauncher>,
) -> Result<ChannelSet, SitekitError> {
    let client = build_http_client(Duration::from_secs(config.leads.attempt_timeout_secs.max(1)))?;

    let chain = config
        .leads
        .channels
        .iter()
        .map(|&kind| build_channel(kind, config, &client, &launcher))
        .collect::<Result<Vec<_>, _>>()?;

    let notifier = config
        .leads
        .notify
        .map(|kind| build_channel(kind, config, &client, &launcher))
        .transpose()?;

    debug!(
        chain = ?config.leads.channels,
        notify = ?config.leads.notify,
        "lead channels built"
    );
    Ok(ChannelSet { chain, notifier })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::TracingLauncher;

    #[test]
    fn builds_chain_in_configured_order() {
        let mut config = SitekitConfig::default();
        config.leads.channels = vec![ChannelKind::Formspree, ChannelKind::Web3forms];
        config.leads.notify = Some(ChannelKind::Telegram);
        config.formspree.form_id = Some("f1".into());
        config.web3forms.access_key = Some("k".into());
        config.telegram.bot_token = Some("1:A".into());
        config.telegram.chat_id = Some("7".into());

        let set = build_channels(&config, Arc::new(TracingLauncher)).unwrap();
        let names: Vec<&str> = set.chain.iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["formspree", "web3forms"]);
        assert_eq!(set.notifier.unwrap().name(), "telegram");
    }

    #[test]
    fn missing_credentials_fail_the_build() {
        let mut config = SitekitConfig::default();
        config.leads.channels = vec![ChannelKind::Emailjs];
        let err = build_channels(&config, Arc::new(TracingLauncher)).err().unwrap();
        assert!(err.to_string().contains("emailjs.service_id"));
    }
}
