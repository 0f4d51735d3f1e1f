use anyhow::Result;
use colored::Colorize;
use medportal_client::{DoctorFilter, PortalApi, SessionStore, filter_doctors};

use crate::cli::{DoctorsListArgs, OutputFormat, VerifyArgs};
use crate::output::{print_doctors, print_success, print_value};
use crate::session;

pub async fn list(store: &SessionStore, args: &DoctorsListArgs, format: OutputFormat) -> Result<()> {
    session::require(store).await?;

    let doctors = PortalApi::new(store.gateway().clone())
        .admin_doctors()
        .await?;
    let filter = DoctorFilter {
        search: args.search.clone(),
        verified: args.unverified.then_some(false),
    };
    let shown: Vec<_> = filter_doctors(&doctors, &filter).collect();
    print_doctors(&shown, format);
    Ok(())
}

pub async fn verify(store: &SessionStore, args: &VerifyArgs, format: OutputFormat) -> Result<()> {
    session::require(store).await?;

    let doctor = PortalApi::new(store.gateway().clone())
        .verify_doctor(args.id)
        .await?;
    print_success(&format!("Verified doctor {}", args.id.to_string().cyan()));
    if !doctor.is_null() {
        print_value(&doctor, format);
    }
    Ok(())
}
