use clap::{Args, ValueEnum};
use serde_json::Value;

use vendor_savings_core::types::{InvestmentLevel, ReminderFrequency};
use vendor_savings_core::vc::admin::admin_hours;
use vendor_savings_core::vc::allocation::{allocate, AllocationStrategy, RemainderPolicy};
use vendor_savings_core::vc::calculator::{
    AdminSavingsPolicy, SavingsCalculator, SavingsInput, SuccessRatePolicy,
};
use vendor_savings_core::vc::segment::{count_range, sample_curve, SegmentCurves};
use vendor_savings_core::vc::VcConfig;

use crate::input;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum AllocationArg {
    CombinationSpecific,
    FixedWeights,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum RemainderArg {
    Independent,
    LargestRemainder,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum AdminPolicyArg {
    Aggregate,
    PerLevel,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SuccessPolicyArg {
    ScaleSavings,
    ScaleCompanies,
}

/// Overrides applied on top of the loaded calibration
#[derive(Args)]
pub struct CalibrationArgs {
    /// How companies are split across levels
    #[arg(long)]
    pub allocation: Option<AllocationArg>,

    /// Rounding of per-level company counts
    #[arg(long)]
    pub remainder: Option<RemainderArg>,

    /// Admin savings over the whole portfolio or per level
    #[arg(long)]
    pub admin_policy: Option<AdminPolicyArg>,

    /// Whether the success rate scales dollars or companies
    #[arg(long)]
    pub success_policy: Option<SuccessPolicyArg>,

    /// Curve preset: current, linear_only, web_quadratic, legacy_quadratic, proposed
    #[arg(long)]
    pub curves: Option<String>,
}

impl CalibrationArgs {
    fn apply(&self, base: &VcConfig) -> Result<VcConfig, Box<dyn std::error::Error>> {
        let mut config = base.clone();
        if let Some(a) = self.allocation {
            config.distribution.strategy = match a {
                AllocationArg::CombinationSpecific => AllocationStrategy::CombinationSpecific,
                AllocationArg::FixedWeights => AllocationStrategy::FixedWeights,
            };
        }
        if let Some(r) = self.remainder {
            config.distribution.remainder = match r {
                RemainderArg::Independent => RemainderPolicy::Independent,
                RemainderArg::LargestRemainder => RemainderPolicy::LargestRemainder,
            };
        }
        if let Some(p) = self.admin_policy {
            config.admin_policy = match p {
                AdminPolicyArg::Aggregate => AdminSavingsPolicy::Aggregate,
                AdminPolicyArg::PerLevel => AdminSavingsPolicy::PerLevel,
            };
        }
        if let Some(p) = self.success_policy {
            config.success_rate_policy = match p {
                SuccessPolicyArg::ScaleSavings => SuccessRatePolicy::ScaleSavings,
                SuccessPolicyArg::ScaleCompanies => SuccessRatePolicy::ScaleCompanies,
            };
        }
        if let Some(ref name) = self.curves {
            config.curves = SegmentCurves::preset(name)
                .ok_or_else(|| format!("Unknown curve preset '{name}'"))?;
        }
        Ok(config)
    }
}

/// Arguments for portfolio savings
#[derive(Args)]
pub struct SavingsArgs {
    /// Total portfolio companies
    #[arg(long)]
    pub companies: Option<u64>,

    /// Investment levels in the portfolio (comma separated: pre-seed,seed,series-a)
    #[arg(long, value_delimiter = ',')]
    pub levels: Vec<InvestmentLevel>,

    /// Reminder frequency: none, quarterly, monthly
    #[arg(long)]
    pub frequency: Option<ReminderFrequency>,

    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    #[command(flatten)]
    pub calibration: CalibrationArgs,
}

/// Arguments for portfolio allocation
#[derive(Args)]
pub struct AllocateArgs {
    /// Total portfolio companies
    #[arg(long)]
    pub companies: Option<u64>,

    /// Investment levels in the portfolio (comma separated)
    #[arg(long, value_delimiter = ',')]
    pub levels: Vec<InvestmentLevel>,

    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    #[command(flatten)]
    pub calibration: CalibrationArgs,
}

/// Arguments for admin time savings
#[derive(Args)]
pub struct AdminSavingsArgs {
    /// Portfolio companies
    #[arg(long)]
    pub companies: i64,
}

/// Arguments for sampling a savings curve
#[derive(Args)]
pub struct CurveArgs {
    /// Investment level whose curve is sampled
    #[arg(long)]
    pub level: InvestmentLevel,

    /// First company count
    #[arg(long, default_value = "0")]
    pub from: i64,

    /// Last company count
    #[arg(long, default_value = "500")]
    pub to: i64,

    /// Number of sample points
    #[arg(long, default_value = "11")]
    pub steps: usize,

    /// Curve preset: current, linear_only, web_quadratic, legacy_quadratic, proposed
    #[arg(long)]
    pub curves: Option<String>,
}

fn read_savings_input(
    path: &Option<String>,
    companies: Option<u64>,
    levels: &[InvestmentLevel],
    frequency: Option<ReminderFrequency>,
) -> Result<SavingsInput, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        input::file::read_json(path)
    } else if let Some(data) = input::stdin::read_stdin()? {
        Ok(data)
    } else {
        Ok(SavingsInput {
            num_companies: companies.ok_or("--companies is required (or provide --input)")?,
            selected_levels: levels.to_vec(),
            reminder_frequency: frequency.unwrap_or_default(),
        })
    }
}

pub fn run_savings(args: SavingsArgs, base: &VcConfig) -> Result<Value, Box<dyn std::error::Error>> {
    let savings_input =
        read_savings_input(&args.input, args.companies, &args.levels, args.frequency)?;
    let config = args.calibration.apply(base)?;
    let result = SavingsCalculator::new(config).calculate(&savings_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_allocate(args: AllocateArgs, base: &VcConfig) -> Result<Value, Box<dyn std::error::Error>> {
    let alloc_input = read_savings_input(&args.input, args.companies, &args.levels, None)?;
    let config = args.calibration.apply(base)?;
    let result = allocate(
        alloc_input.num_companies,
        &alloc_input.selected_levels,
        &config.distribution,
    )?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_admin_savings(
    args: AdminSavingsArgs,
    base: &VcConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let result = admin_hours(args.companies, &base.admin);
    Ok(serde_json::to_value(result)?)
}

pub fn run_curve(args: CurveArgs, base: &VcConfig) -> Result<Value, Box<dyn std::error::Error>> {
    let curves = match args.curves {
        Some(ref name) => SegmentCurves::preset(name)
            .ok_or_else(|| format!("Unknown curve preset '{name}'"))?,
        None => base.curves.clone(),
    };
    let spec = curves.get(args.level);
    let points = sample_curve(spec, &count_range(args.from, args.to, args.steps))?;
    Ok(serde_json::json!({
        "level": args.level,
        "model": spec,
        "points": points,
    }))
}
