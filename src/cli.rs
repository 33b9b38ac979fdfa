use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::annotate::{CornerBox, Offset};
use thermal_inspect_common::edit::Handle;
use thermal_inspect_common::region::RegionStatus;
use thermal_inspect_common::types::{ImageType, InspectionStatus, RecordStatus, TransformerType, Weather};

#[derive(Parser)]
#[command(name = "thermal-inspect")]
#[command(about = "Transformer thermal inspection client", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Backend base URL (overrides config and THERMAL_API_URL)
    #[arg(long, global = true)]
    pub api_url: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Log in and keep the session for later commands
    Login {
        /// User name
        #[arg(short, long)]
        name: String,

        /// Password (prompted when omitted)
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Forget the stored session
    Logout,

    /// Transformers
    Transformer {
        #[command(subcommand)]
        action: TransformerCommand,
    },

    /// Inspections of a transformer
    Inspection {
        #[command(subcommand)]
        action: InspectionCommand,
    },

    /// Thermal images
    Image {
        #[command(subcommand)]
        action: ImageCommand,
    },

    /// Annotated anomaly regions of a maintenance image
    Region {
        #[command(subcommand)]
        action: RegionCommand,
    },

    /// Baseline vs maintenance comparison for an inspection
    Compare {
        /// Transformer id
        #[arg(short, long)]
        transformer: String,

        /// Inspection id
        #[arg(short, long)]
        inspection: String,

        /// Maintenance image to show (1 = newest)
        #[arg(long, default_value = "1")]
        index: usize,
    },

    /// Queue model training for a baseline/maintenance pair
    Train {
        /// Transformer id
        #[arg(short, long)]
        transformer: String,

        /// Inspection id (pairs its newest maintenance image with the latest baseline)
        #[arg(short, long, required_unless_present = "maintenance")]
        inspection: Option<String>,

        /// Baseline image id (default: latest baseline)
        #[arg(long)]
        baseline: Option<String>,

        /// Maintenance image id
        #[arg(long)]
        maintenance: Option<String>,
    },

    /// Maintenance records
    Record {
        #[command(subcommand)]
        action: RecordCommand,
    },

    /// Administration
    Admin {
        #[command(subcommand)]
        action: AdminCommand,
    },

    /// Show or edit configuration
    Config {
        /// Set the backend base URL
        #[arg(long)]
        set_api_url: Option<String>,

        /// Set the name used for annotation provenance
        #[arg(long)]
        set_user: Option<String>,

        /// Queue training after editing regions (true/false)
        #[arg(long)]
        auto_train: Option<bool>,

        /// Show configuration
        #[arg(long)]
        show: bool,
    },
}

#[derive(Subcommand)]
pub enum TransformerCommand {
    /// List transformers
    List {
        /// Search transformer no, pole no, region or type
        #[arg(short, long, default_value = "")]
        search: String,

        /// Region filter
        #[arg(short, long, default_value = "All")]
        region: String,

        /// Type filter (BULK/DISTRIBUTION)
        #[arg(short = 't', long = "type", default_value = "All")]
        transformer_type: String,
    },

    /// Show one transformer with its inspections
    Show { id: String },

    /// Create a transformer
    Create(TransformerFields),

    /// Update a transformer
    Update {
        id: String,

        #[command(flatten)]
        fields: TransformerPatch,
    },

    /// Delete a transformer
    Delete {
        id: String,

        /// Skip confirmation
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Args)]
pub struct TransformerFields {
    /// Transformer number, e.g. T-100
    #[arg(long)]
    pub no: String,

    /// Pole number
    #[arg(long, default_value = "")]
    pub pole: String,

    /// Region
    #[arg(long)]
    pub region: String,

    /// Type (bulk/distribution)
    #[arg(long = "type")]
    pub transformer_type: TransformerType,
}

#[derive(Args)]
pub struct TransformerPatch {
    #[arg(long)]
    pub no: Option<String>,

    #[arg(long)]
    pub pole: Option<String>,

    #[arg(long)]
    pub region: Option<String>,

    #[arg(long = "type")]
    pub transformer_type: Option<TransformerType>,
}

#[derive(Subcommand)]
pub enum InspectionCommand {
    /// List inspections with status counts
    List {
        #[arg(short, long)]
        transformer: String,

        /// Only this status (open/in_progress/closed)
        #[arg(short, long)]
        status: Option<InspectionStatus>,
    },

    /// Create an inspection
    Create {
        #[arg(short, long)]
        transformer: String,

        /// Title, at least 3 characters
        #[arg(long)]
        title: String,

        /// Inspector name
        #[arg(long)]
        inspector: String,

        #[arg(long)]
        notes: Option<String>,

        #[arg(long, default_value = "open")]
        status: InspectionStatus,
    },

    /// Delete an inspection
    Delete {
        #[arg(short, long)]
        transformer: String,

        id: String,

        /// Skip confirmation
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
pub enum ImageCommand {
    /// List images of a transformer
    List {
        #[arg(short, long)]
        transformer: String,
    },

    /// Upload a thermal image
    Upload {
        #[arg(short, long)]
        transformer: String,

        /// Image file
        #[arg(required = true)]
        file: PathBuf,

        /// baseline or maintenance
        #[arg(long = "type")]
        image_type: ImageType,

        /// Uploader name (default: logged-in user)
        #[arg(long)]
        uploader: Option<String>,

        /// Inspection the maintenance image belongs to
        #[arg(short, long)]
        inspection: Option<String>,

        /// Weather, required for baselines (sunny/cloudy/rainy)
        #[arg(long)]
        weather: Option<Weather>,

        #[arg(long)]
        temperature: Option<f64>,

        #[arg(long)]
        humidity: Option<f64>,

        #[arg(long)]
        location_note: Option<String>,
    },

    /// Download the raw image bytes
    Raw {
        image: String,

        #[arg(short, long)]
        output: PathBuf,
    },

    /// Download the anomaly comparison rendering
    Comparison {
        image: String,

        #[arg(short, long)]
        output: PathBuf,
    },
}

#[derive(Subcommand)]
pub enum RegionCommand {
    /// List regions, deleted ones included
    List { image: String },

    /// Draw a new region (natural pixels)
    Add {
        image: String,

        /// Transformer of the image; enables auto-train after the edit
        #[arg(short, long)]
        transformer: Option<String>,

        /// Box as x,y,w,h from the top-left corner
        #[arg(long = "box")]
        rect: CornerBox,

        /// faulty or potential
        #[arg(long, default_value = "faulty")]
        status: RegionStatus,

        #[arg(long)]
        label: Option<String>,

        #[arg(long)]
        comment: Option<String>,
    },

    /// Move, resize or relabel a region
    Update {
        image: String,

        /// Region number as listed
        number: usize,

        /// Transformer of the image; enables auto-train after the edit
        #[arg(short, long)]
        transformer: Option<String>,

        /// New box as x,y,w,h
        #[arg(long = "box")]
        rect: Option<CornerBox>,

        /// Move by dx,dy
        #[arg(long = "move", allow_hyphen_values = true)]
        offset: Option<Offset>,

        /// Handle to drag (nw/ne/sw/se/n/s/w/e), with --by
        #[arg(long, requires = "by")]
        handle: Option<Handle>,

        /// Handle drag as dx,dy
        #[arg(long, requires = "handle", allow_hyphen_values = true)]
        by: Option<Offset>,

        #[arg(long)]
        status: Option<RegionStatus>,

        #[arg(long)]
        label: Option<String>,

        #[arg(long)]
        comment: Option<String>,
    },

    /// Mark a region deleted
    Delete {
        image: String,

        /// Region number as listed
        number: usize,

        /// Transformer of the image; enables auto-train after the edit
        #[arg(short, long)]
        transformer: Option<String>,

        /// Skip confirmation
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
pub enum RecordCommand {
    /// Show the prefilled record form
    Form {
        #[arg(short, long)]
        transformer: String,

        #[arg(short, long)]
        inspection: Option<String>,

        #[arg(long)]
        image: Option<String>,
    },

    /// Create or update the record for an inspection image
    Save {
        #[arg(short, long)]
        transformer: String,

        #[arg(short, long)]
        inspection: Option<String>,

        #[arg(long)]
        image: Option<String>,

        /// Inspector name (default: form value)
        #[arg(long)]
        inspector: Option<String>,

        /// ok/needs_maintenance/urgent_attention
        #[arg(long)]
        status: Option<RecordStatus>,

        /// Inspection time, e.g. 2025-03-01T10:15
        #[arg(long)]
        timestamp: Option<String>,

        /// Electrical reading as key=value (repeatable)
        #[arg(long = "reading", value_parser = parse_reading)]
        readings: Vec<(String, String)>,

        #[arg(long)]
        action: Option<String>,

        #[arg(long)]
        remarks: Option<String>,
    },

    /// Maintenance history, newest first
    List {
        #[arg(short, long)]
        transformer: String,
    },

    /// Show one record
    Show { record: String },

    /// Export a record as PDF
    Pdf {
        #[arg(short, long)]
        transformer: String,

        record: String,

        /// Output file or directory
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Export the maintenance history as Excel
    Excel {
        #[arg(short, long)]
        transformer: String,

        /// Output file or directory
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum AdminCommand {
    /// Create a user (admin only)
    CreateUser {
        #[arg(short, long)]
        name: String,

        /// Password (prompted when omitted)
        #[arg(short, long)]
        password: Option<String>,

        #[arg(long)]
        occupation: Option<String>,
    },
}

fn parse_reading(s: &str) -> Result<(String, String), String> {
    let (k, v) = s
        .split_once('=')
        .ok_or_else(|| format!("Expected key=value, got: {}", s))?;
    Ok((k.trim().to_string(), v.trim().to_string()))
}
