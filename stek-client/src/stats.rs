/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use crate::RequestOutcome;

#[derive(Default, Debug)]
pub struct ResumptionStats {
    pub total: u64,
    pub failed: u64,
    pub full_handshake: u64,
    pub reused: u64,
}

impl ResumptionStats {
    pub fn add_outcome(&mut self, outcome: &RequestOutcome) {
        self.total += 1;
        if outcome.session_reused {
            self.reused += 1;
        } else {
            self.full_handshake += 1;
        }
    }

    pub fn add_failed(&mut self) {
        self.total += 1;
        self.failed += 1;
    }

    /// Ratio of resumed handshakes in all successful ones.
    pub fn reuse_ratio(&self) -> f64 {
        let passed = self.reused + self.full_handshake;
        if passed == 0 {
            0.0
        } else {
            self.reused as f64 / passed as f64
        }
    }

    pub fn summary(&self) {
        println!();
        println!("Requests Total:  {}", self.total);
        println!("Requests Failed: {}", self.failed);
        println!("Full Handshake:  {}", self.full_handshake);
        println!("Session Reused:  {}", self.reused);
        println!("Reuse Ratio:     {:.2}%", self.reuse_ratio() * 100.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(session_reused: bool) -> RequestOutcome {
        RequestOutcome {
            status: 200,
            body: Vec::new(),
            session_reused,
            protocol: "TLSv1_3".to_string(),
            cipher_suite: "TLS13_AES_256_GCM_SHA384".to_string(),
            server_reports_reused: Some(session_reused),
        }
    }

    #[test]
    fn ratio() {
        let mut stats = ResumptionStats::default();
        assert_eq!(stats.reuse_ratio(), 0.0);

        stats.add_outcome(&outcome(false));
        stats.add_outcome(&outcome(true));
        stats.add_outcome(&outcome(true));
        stats.add_outcome(&outcome(true));
        stats.add_failed();
        assert_eq!(stats.total, 5);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.full_handshake, 1);
        assert_eq!(stats.reused, 3);
        assert_eq!(stats.reuse_ratio(), 0.75);
    }
}
