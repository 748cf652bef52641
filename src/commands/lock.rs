//! Implementation of the `adc-bus lock` commands.

use crate::cli::LockClearArgs;
use adc_bus::config::Config;
use adc_bus::error::{AdcError, Result};
use adc_bus::locks::{self, LockInfo, LockState};
use adc_bus::logging::prelude::*;

pub fn cmd_lock_list(config: &Config) -> Result<()> {
    let settings = config.lock_settings();
    let locks = locks::list_locks(&settings.lock_dir, settings.stale_after)?;

    if locks.is_empty() {
        println!("No bus locks in {}.", settings.lock_dir.display());
        return Ok(());
    }

    println!("Bus locks ({}):", locks.len());
    println!();

    for lock in &locks {
        print_lock(lock, "  ");
        println!();
    }

    // Summary
    let stale_count = locks
        .iter()
        .filter(|l| l.state == LockState::Stale)
        .count();
    if stale_count > 0 {
        println!(
            "Note: {} lock(s) are stale. The next reader recovers them, or use \
             `adc-bus lock clear <lock-id> --force`.",
            stale_count
        );
    }

    Ok(())
}

pub fn cmd_lock_clear(config: &Config, args: LockClearArgs) -> Result<()> {
    // Require --force flag
    if !args.force {
        return Err(AdcError::UserError(
            "refusing to clear lock without --force flag.\n\n\
             Clearing a lock while its holder is still talking to the converter \
             lets two transfers interleave on the bus.\n\
             Only clear locks if you are certain the lock holder has crashed or hung.\n\n\
             To clear the lock, run:\n  adc-bus lock clear {} --force"
                .replace("{}", &args.lock_id),
        ));
    }

    let settings = config.lock_settings();
    let cleared = locks::clear_lock(&settings.lock_dir, &args.lock_id, settings.stale_after)?;

    info!(
        lock = %cleared.key,
        state = cleared.state.as_str(),
        owner = cleared.metadata.as_ref().map(|m| m.owner.as_str()).unwrap_or(""),
        "bus lock cleared by operator"
    );

    println!("Cleared lock: {}", cleared.key);
    println!();
    println!("Lock details:");
    print_details(&cleared, "  ");
    if cleared.state == LockState::Held {
        println!("  Warning:    the holder was still running");
    }

    Ok(())
}

fn print_lock(lock: &LockInfo, indent: &str) {
    println!("{}{} ({}):", indent, lock.key, lock.state.as_str());
    print_details(lock, &format!("{}  ", indent));
}

fn print_details(lock: &LockInfo, indent: &str) {
    println!("{}Bus:        {}", indent, lock.wiring);
    if let Some(meta) = &lock.metadata {
        println!("{}Owner:      {}", indent, meta.owner);
        if let Some(pid) = meta.pid {
            println!("{}PID:        {}", indent, pid);
        }
        println!("{}Device:     {}", indent, meta.device);
        println!(
            "{}Created:    {}",
            indent,
            meta.created_at.format("%Y-%m-%d %H:%M:%S UTC")
        );
        println!("{}Age:        {}", indent, meta.age_string());
    }
    println!("{}Path:       {}", indent, lock.path.display());
}
