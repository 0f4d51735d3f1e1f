use anyhow::Result;
use medportal_client::{PortalApi, SessionStore};

use crate::cli::{DashboardRole, OutputFormat};
use crate::output::print_value;
use crate::session;

pub async fn show(store: &SessionStore, role: DashboardRole, format: OutputFormat) -> Result<()> {
    session::require(store).await?;

    let api = PortalApi::new(store.gateway().clone());
    let dashboard = match role {
        DashboardRole::Doctor => api.doctor_dashboard().await?,
        DashboardRole::Lab => api.lab_dashboard().await?,
        DashboardRole::Patient => api.patient_dashboard().await?,
    };
    print_value(&dashboard, format);
    Ok(())
}
