use colored::Colorize;
use orgflow_cloud::{AccountProvisioner, DEFAULT_REGION};
use orgflow_cloud_aws::AwsOrganizations;
use std::sync::Arc;

/// Organizations is a global service; any region reaches it
async fn provisioner() -> AccountProvisioner {
    let sdk_config = orgflow_cloud_aws::load_config(DEFAULT_REGION).await;
    AccountProvisioner::new(Arc::new(AwsOrganizations::new(&sdk_config)))
}

pub async fn create_ou(name: &str, parent_id: &str) -> anyhow::Result<()> {
    println!("{}", format!("Creating organizational unit {}...", name).blue());
    let ou = provisioner()
        .await
        .create_organizational_unit(name, parent_id)
        .await?;
    println!("  ✓ {} ({})", ou.name.cyan(), ou.id);
    Ok(())
}

pub async fn create_account(name: &str, email: &str, ou: Option<&str>) -> anyhow::Result<()> {
    println!("{}", format!("Creating account {} <{}>...", name, email).blue());
    println!("  ℹ account creation usually takes a few minutes");
    let account = provisioner().await.create_account(name, email, ou).await?;
    println!("  ✓ {} ({})", account.name.cyan(), account.account_id);
    if let Some(ou) = ou {
        println!("  ✓ moved into {}", ou);
    }
    Ok(())
}

pub async fn attach_scp(policy_id: &str, target_id: &str) -> anyhow::Result<()> {
    provisioner()
        .await
        .attach_policy(policy_id, target_id)
        .await?;
    println!("  ✓ {} attached to {}", policy_id.cyan(), target_id);
    Ok(())
}

pub async fn list_accounts() -> anyhow::Result<()> {
    let accounts = provisioner().await.list_accounts().await?;

    println!("{}", format!("Accounts ({}):", accounts.len()).bold());
    for account in &accounts {
        let status = if account.status.is_closing() {
            account.status.to_string().dimmed()
        } else {
            account.status.to_string().green()
        };
        println!(
            "  • {:<14} {:<24} {:<32} {}",
            account.id,
            account.name.cyan(),
            account.email,
            status
        );
    }
    Ok(())
}

pub async fn delete_account(account_id: &str) -> anyhow::Result<()> {
    println!("{}", format!("Closing account {}...", account_id).yellow());
    provisioner().await.delete_account(account_id).await?;
    println!("  ✓ closure requested; the account stays suspended until it is fully closed");
    Ok(())
}

pub async fn delete_ou(ou_id: &str) -> anyhow::Result<()> {
    provisioner().await.delete_organizational_unit(ou_id).await?;
    println!("  ✓ organizational unit {} deleted", ou_id.cyan());
    Ok(())
}
