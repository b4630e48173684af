//! Block-explorer links for the configured network.

use alloy::primitives::Address;
use parcero_wallet_core::WalletSettings;

/// Token contract page, e.g. `https://polygonscan.com/token/0x…`.
pub fn token_url(settings: &WalletSettings) -> Option<String> {
    settings.token_explorer_url()
}

/// Account page on the same explorer.
pub fn address_url(settings: &WalletSettings, address: Address) -> Option<String> {
    settings
        .network
        .primary_explorer()
        .map(|base| format!("{base}/address/{}", address.to_checksum(None)))
}

/// Open URL in a new browser tab
#[cfg(target_arch = "wasm32")]
pub fn open_url_new_tab(url: &str) -> eyre::Result<()> {
    let window = web_sys::window().ok_or_else(|| eyre::eyre!("missing window"))?;
    window
        .open_with_url_and_target(url, "_blank")
        .map_err(|e| eyre::eyre!("window.open failed: {e:?}"))?
        .ok_or_else(|| eyre::eyre!("popup blocked"))?;
    Ok(())
}

#[cfg(not(target_arch = "wasm32"))]
pub fn open_url_new_tab(url: &str) -> eyre::Result<()> {
    open::that(url)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn links_point_at_polygonscan() {
        let settings = WalletSettings::default();
        let token = token_url(&settings).expect("token url");
        assert!(token.starts_with("https://polygonscan.com/token/0x"));

        let owner: Address = "0x1000000000000000000000000000000000000001"
            .parse()
            .expect("address");
        assert_eq!(
            address_url(&settings, owner).as_deref(),
            Some("https://polygonscan.com/address/0x1000000000000000000000000000000000000001")
        );
    }

    #[test]
    fn no_explorer_means_no_link() {
        let mut settings = WalletSettings::default();
        settings.network.block_explorer_urls.clear();
        assert_eq!(token_url(&settings), None);
    }
}
