use serde::Deserialize;

use super::Symbol;

/// Body of `GET /finnhub/peers/{symbol}`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct PeersResponse {
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub peers: Vec<String>,
    #[serde(default)]
    pub grouping: String,
}

impl PeersResponse {
    /// Peer tickers in backend order, without the company itself and without repeats.
    /// Finnhub lists the queried symbol among its own peers.
    pub fn into_peers(self, own: &Symbol) -> Vec<Symbol> {
        let mut out: Vec<Symbol> = Vec::with_capacity(self.peers.len());
        for peer in self.peers.iter().map(|p| Symbol::new(p)) {
            if peer.is_empty() || &peer == own || out.contains(&peer) {
                continue;
            }
            out.push(peer);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn own_symbol_and_repeats_are_dropped() {
        let response: PeersResponse = serde_json::from_str(
            r#"{"symbol":"AAPL","peers":["AAPL","DELL","hpq","DELL",""],"grouping":"subIndustry","count":5}"#,
        )
        .unwrap();
        let peers = response.into_peers(&Symbol::new("AAPL"));
        assert_eq!(peers, [Symbol::new("DELL"), Symbol::new("HPQ")]);
    }
}
