//! Operator command line for the hospital administration core.
//!
//! Usage:
//!   hospital-admin --config hospital.toml migrate
//!   hospital-admin beds
//!   hospital-admin report --kind revenue --from 2024-04-01 --to 2024-04-30 --csv revenue.csv
//!   hospital-admin pay --invoice INV-20240402-0001 --amount 50.00 --method cash
//!   hospital-admin invoices --overdue
//!   hospital-admin audit
//!
//! Logging goes to stderr and is controlled by `RUST_LOG` (default `info`).

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;

use hospital_admin_core::db::latest_version;
use hospital_admin_core::{
    AppConfig, BedOccupancy, DateRange, HospitalCore, PaymentMethod, ReportFilter, ReportKind,
};

/// Hospital administration tools
#[derive(Parser, Debug)]
#[command(name = "hospital-admin")]
#[command(about = "Billing, bed occupancy and reporting for the hospital back office")]
struct Cli {
    /// Configuration file (TOML). Defaults are used when omitted.
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    /// Database path, overriding the configuration
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Recorded as the actor on audited changes
    #[arg(long, global = true, default_value = "cli")]
    actor: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create or upgrade the database schema
    Migrate,

    /// Show bed occupancy per type and hospital-wide
    Beds {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Build a report
    Report {
        /// appointments, revenue, departments, doctors, medicines or lab_tests
        #[arg(long, short = 'k')]
        kind: ReportKind,

        /// First day (YYYY-MM-DD); defaults to 30 days before --to
        #[arg(long)]
        from: Option<NaiveDate>,

        /// Last day (YYYY-MM-DD); defaults to today
        #[arg(long)]
        to: Option<NaiveDate>,

        /// Only activity of this doctor (id)
        #[arg(long)]
        doctor: Option<String>,

        /// Only activity of doctors in this department
        #[arg(long)]
        department: Option<String>,

        /// Write CSV to this file ("-" for stdout)
        #[arg(long)]
        csv: Option<PathBuf>,
    },

    /// Record a payment against an invoice
    Pay {
        /// Invoice number or id
        #[arg(long, short = 'i')]
        invoice: String,

        #[arg(long, short = 'a')]
        amount: Decimal,

        /// cash, card, insurance, bank_transfer or other
        #[arg(long, short = 'm', default_value = "cash")]
        method: PaymentMethod,

        /// Receipt, card slip or claim number
        #[arg(long)]
        reference: Option<String>,
    },

    /// List invoices in a date range
    Invoices {
        #[arg(long)]
        from: Option<NaiveDate>,

        #[arg(long)]
        to: Option<NaiveDate>,

        /// Only unpaid invoices past their due date
        #[arg(long)]
        overdue: bool,
    },

    /// Verify the audit log hash chain
    Audit {
        /// Also print every entry
        #[arg(long)]
        list: bool,
    },
}

const DEFAULT_REPORT_DAYS: u32 = 30;

/// Resolve optional CLI dates to a range, defaulting to the last 30 days.
fn resolve_range(
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    today: NaiveDate,
) -> Result<DateRange> {
    let to = to.unwrap_or(today);
    let range = match from {
        Some(from) => DateRange::new(from, to)?,
        None => DateRange::last_days(to, DEFAULT_REPORT_DAYS),
    };
    Ok(range)
}

fn load_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = AppConfig::load_or_default(cli.config.as_deref())
        .context("failed to load configuration")?;
    if let Some(path) = &cli.db {
        config.database.path = path.clone();
    }
    Ok(config)
}

fn print_beds(occupancy: &BedOccupancy) {
    println!(
        "{:<20} {:>8} {:>10} {:>9} {:>8} {:>11} {:>8} {:>11} {:>9}",
        "Type", "Capacity", "Registered", "Available", "Occupied", "Maintenance", "Reserved",
        "Not created", "Occupancy"
    );
    for stats in &occupancy.per_type {
        println!(
            "{:<20} {:>8} {:>10} {:>9} {:>8} {:>11} {:>8} {:>11} {:>8}%",
            stats.label,
            stats.capacity,
            stats.counts.registered,
            stats.available_displayed(),
            stats.counts.occupied,
            stats.counts.maintenance,
            stats.counts.reserved,
            stats.not_created,
            stats.occupancy_rate(),
        );
        if stats.over_capacity > 0 {
            println!("  ! {} beds registered beyond capacity", stats.over_capacity);
        }
    }
    for (bed_type, counts) in &occupancy.uncatalogued {
        println!(
            "{:<20} {:>8} {:>10} {:>9} {:>8} {:>11} {:>8} {:>11}",
            format!("{} (?)", bed_type),
            "-",
            counts.registered,
            counts.available,
            counts.occupied,
            counts.maintenance,
            counts.reserved,
            "-",
        );
    }

    let global = &occupancy.global;
    println!();
    println!(
        "Total: {} beds, {} available, {} occupied, {} maintenance, {} reserved ({}% occupied)",
        global.capacity,
        global.available_displayed,
        global.counts.occupied,
        global.counts.maintenance,
        global.counts.reserved,
        global.occupancy_rate(),
    );
}

fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;
    let core = HospitalCore::open(config).context("failed to open database")?;
    let today = chrono::Local::now().date_naive();

    match cli.command {
        Command::Migrate => {
            println!("Schema is at version {}", latest_version());
        }

        Command::Beds { json } => {
            let occupancy = core.bed_occupancy()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&occupancy)?);
            } else {
                print_beds(&occupancy);
            }
        }

        Command::Report {
            kind,
            from,
            to,
            doctor,
            department,
            csv,
        } => {
            let range = resolve_range(from, to, today)?;
            let filter = ReportFilter {
                doctor_id: doctor,
                department,
            };
            let report = core.build_report(kind, range, &filter)?;

            match csv {
                Some(path) if path.as_os_str() == "-" => print!("{}", report.to_csv()),
                Some(path) => {
                    std::fs::write(&path, report.to_csv())
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    tracing::info!(path = %path.display(), "report written");
                }
                None => {
                    println!("{} ({})", report.title, report.range);
                    print!("{}", report.to_csv());
                }
            }
        }

        Command::Pay {
            invoice,
            amount,
            method,
            reference,
        } => {
            let target = match core.get_invoice_by_number(&invoice)? {
                Some(found) => found,
                None => core
                    .get_invoice(&invoice)?
                    .with_context(|| format!("no invoice {}", invoice))?,
            };
            let receipt = core.record_payment(&target.id, amount, method, reference, &cli.actor)?;

            println!(
                "{}: paid {:.2} of {:.2} ({})",
                receipt.invoice.invoice_number,
                receipt.invoice.paid_amount,
                receipt.invoice.total_amount,
                receipt.invoice.payment_status,
            );
            if receipt.payment.is_none() {
                println!("Nothing applied; the invoice has no outstanding balance");
            }
            if !receipt.excess.is_zero() {
                println!("Excess to return: {:.2}", receipt.excess);
            }
        }

        Command::Invoices { from, to, overdue } => {
            let range = resolve_range(from, to, today)?;
            let invoices = if overdue {
                core.list_overdue_invoices(range, today)?
            } else {
                core.list_invoices(range)?
            };
            for invoice in &invoices {
                println!(
                    "{:<24} {} {:>12.2} {:>12.2} {}",
                    invoice.invoice_number,
                    invoice.invoice_date,
                    invoice.total_amount,
                    invoice.balance_due(),
                    invoice.payment_status,
                );
            }
            println!("{} invoice(s)", invoices.len());
        }

        Command::Audit { list } => {
            if list {
                for entry in core.audit_entries()? {
                    println!(
                        "{:>6} {} {:<8} {}/{} by {}",
                        entry.seq,
                        entry.created_at,
                        entry.action,
                        entry.entity,
                        entry.entity_id,
                        entry.actor
                    );
                }
            }
            let verification = core.verify_audit_log()?;
            if !verification.valid {
                bail!(
                    "audit chain broken at entry {} ({} entries checked)",
                    verification.first_broken.unwrap_or_default(),
                    verification.entries
                );
            }
            println!("Audit chain intact ({} entries)", verification.entries);
        }
    }

    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    run(Cli::parse())
}
