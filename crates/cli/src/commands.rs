use anyhow::{Context, bail};
use pairly_services::{InviteService, JoinStatus};
use serde::Serialize;
use std::time::Duration;
use tracing::info;

use crate::cli::Command;

pub async fn run(service: &InviteService, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Create { inviter, ttl_ms } => {
            let invite = service
                .create_invite(&inviter, ttl_ms.map(Duration::from_millis))
                .await?;
            print_json(&invite)
        }
        Command::Get { invite_id } => {
            let invite = service.get_invite(&invite_id).await?;
            print_json(&invite)
        }
        Command::Join { invite_id, caller } => {
            let outcome = service.join_invite(&invite_id, &caller).await?;
            print_json(&outcome)
        }
        Command::Reissue { invite_id, caller } => {
            let outcome = service.reissue_invite(&invite_id, &caller).await?;
            print_json(&outcome)
        }
        Command::Revoke { invite_id, caller } => {
            let outcome = service.revoke_invite(&invite_id, &caller).await?;
            print_json(&outcome)
        }
        Command::Demo {
            inviter,
            invitee,
            outsider,
        } => demo(service, &inviter, &invitee, &outsider).await,
    }
}

async fn demo(
    service: &InviteService,
    inviter: &str,
    invitee: &str,
    outsider: &str,
) -> anyhow::Result<()> {
    let invite = service.create_invite(inviter, None).await?;
    let id = invite.invite_id.clone();
    info!(invite_id = %id, "Demo invite created");

    let steps = [
        (inviter, JoinStatus::Pending),
        (invitee, JoinStatus::Paired),
        (inviter, JoinStatus::Paired),
        (outsider, JoinStatus::Paired),
    ];
    for (caller, expected) in steps {
        let outcome = service.join_invite(&id, caller).await?;
        print_json(&outcome)?;
        if outcome.status() != expected {
            bail!("join by {caller} returned {:?}, expected {:?}", outcome.status(), expected);
        }
    }

    let revoked = service.revoke_invite(&id, inviter).await?;
    if !revoked.is_ok() {
        bail!("demo invite {id} could not be revoked: {revoked:?}");
    }
    info!(invite_id = %id, "Demo invite cleaned up");
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Failed to render output")?;
    println!("{out}");
    Ok(())
}
