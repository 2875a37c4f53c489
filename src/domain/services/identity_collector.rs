/*
Copyright 2024 San Francisco Compute Company

Licensed under the Apache License, Version 2.0 (the "License");
you may not use this file except in compliance with the License.
You may obtain a copy of the License at

    http://www.apache.org/licenses/LICENSE-2.0

Unless required by applicable law or agreed to in writing, software
distributed under the License is distributed on an "AS IS" BASIS,
WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
See the License for the specific language governing permissions and
limitations under the License.
*/

use crate::domain::parsers::parse_join_state;
use crate::domain::{
    Collected, CollectionError, DomainDescriptor, FailureReason, IdentityFacts, JoinState,
    ProbeError, SectionKind,
};
use crate::ports::PlatformProbe;
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Duration;

/// Collects the identity section
///
/// Gated on the platform's domain service capability. Domain/workgroup
/// and managed identity join are independent queries run side by side:
/// either failing is recorded on its own fields, and the section is only
/// unavailable when both fail.
pub struct IdentityCollector {
    probe: Arc<dyn PlatformProbe>,
}

impl IdentityCollector {
    pub fn new(probe: Arc<dyn PlatformProbe>) -> Self {
        Self { probe }
    }

    pub async fn collect(&self, status_timeout: Duration) -> Collected<IdentityFacts> {
        if !self.probe.capabilities().domain_services {
            debug!("Platform has no domain services, identity not collected");
            return Collected::Unavailable(CollectionError::new(
                SectionKind::Identity,
                FailureReason::PlatformUnsupported,
                format!("{} has no domain services", self.probe.platform_name()),
            ));
        }

        let (domain, (managed_identity_joined, join_check_error)) = tokio::join!(
            self.probe.query_domain_info(),
            self.check_join(status_timeout),
        );

        let (domain, domain_error) = match domain {
            Ok(domain) => (domain, None),
            Err(e) => {
                warn!("Domain query failed: {e}");
                let err = CollectionError::from_probe(SectionKind::Identity, &e);
                if join_check_error.is_some() {
                    return Collected::Unavailable(err);
                }
                (DomainDescriptor::default(), Some(err))
            }
        };

        info!(
            "Identity: domain={:?} workgroup={:?} managed_identity_joined={}",
            domain.domain,
            domain.workgroup,
            managed_identity_joined.display_name()
        );

        Collected::Value(IdentityFacts {
            domain: domain.domain,
            workgroup: domain.workgroup,
            part_of_domain: domain.part_of_domain,
            managed_identity_joined,
            domain_error,
            join_check_error,
        })
    }

    /// Run the external join check under `status_timeout`
    ///
    /// The probe is asked to honour the timeout itself; the outer bound
    /// covers probes that do not.
    async fn check_join(&self, status_timeout: Duration) -> (JoinState, Option<CollectionError>) {
        let result = match tokio::time::timeout(
            status_timeout,
            self.probe.query_managed_identity_status(status_timeout),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(ProbeError::Timeout(format!(
                "managed identity status check exceeded {} ms",
                status_timeout.as_millis()
            ))),
        };

        match result {
            Ok(output) => {
                let state = parse_join_state(&output);
                if state == JoinState::Unknown {
                    debug!("Managed identity status output had no recognisable join state");
                }
                (state, None)
            }
            Err(e) => {
                warn!("Managed identity status check failed: {e}");
                (
                    JoinState::Unknown,
                    Some(CollectionError::from_probe(SectionKind::Identity, &e)),
                )
            }
        }
    }
}
