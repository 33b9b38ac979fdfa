use anyhow::Context as _;
use clap::Parser;
use thermal_inspect::cli::{
    AdminCommand, Cli, Commands, ImageCommand, InspectionCommand, RecordCommand, RegionCommand,
    TransformerCommand,
};
use thermal_inspect::commands::{self, record::RecordArgs, Context};
use thermal_inspect::error::Result;
use thermal_inspect::notify::Notification;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "thermal_inspect=debug"
    } else {
        "thermal_inspect=warn"
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut ctx = Context::load(cli.api_url.clone()).context("failed to load configuration or session")?;
    match run(cli.command, &mut ctx).await {
        Ok(notification) => {
            notification.print();
            Ok(())
        }
        Err(e) => {
            tracing::debug!(error = ?e, "command failed");
            Notification::from_error(&e, "Request failed").print();
            std::process::exit(1);
        }
    }
}

async fn run(command: Commands, ctx: &mut Context) -> Result<Notification> {
    match command {
        Commands::Login { name, password } => commands::account::login(ctx, &name, password).await,

        Commands::Logout => commands::account::logout(ctx),

        Commands::Transformer { action } => match action {
            TransformerCommand::List {
                search,
                region,
                transformer_type,
            } => commands::transformer::list(ctx, &search, &region, &transformer_type).await,
            TransformerCommand::Show { id } => commands::transformer::show(ctx, &id).await,
            TransformerCommand::Create(fields) => commands::transformer::create(ctx, fields).await,
            TransformerCommand::Update { id, fields } => commands::transformer::update(ctx, &id, fields).await,
            TransformerCommand::Delete { id, yes } => commands::transformer::delete(ctx, &id, yes).await,
        },

        Commands::Inspection { action } => match action {
            InspectionCommand::List { transformer, status } => {
                commands::inspection::list(ctx, &transformer, status).await
            }
            InspectionCommand::Create {
                transformer,
                title,
                inspector,
                notes,
                status,
            } => {
                commands::inspection::create(ctx, &transformer, &title, &inspector, notes.as_deref(), status)
                    .await
            }
            InspectionCommand::Delete { transformer, id, yes } => {
                commands::inspection::delete(ctx, &transformer, &id, yes).await
            }
        },

        Commands::Image { action } => match action {
            ImageCommand::List { transformer } => commands::image::list(ctx, &transformer).await,
            ImageCommand::Upload {
                transformer,
                file,
                image_type,
                uploader,
                inspection,
                weather,
                temperature,
                humidity,
                location_note,
            } => {
                commands::image::upload(
                    ctx,
                    &transformer,
                    &file,
                    image_type,
                    uploader,
                    inspection,
                    weather,
                    temperature,
                    humidity,
                    location_note,
                )
                .await
            }
            ImageCommand::Raw { image, output } => commands::image::raw(ctx, &image, &output).await,
            ImageCommand::Comparison { image, output } => {
                commands::image::comparison(ctx, &image, &output).await
            }
        },

        Commands::Region { action } => match action {
            RegionCommand::List { image } => commands::region::list(ctx, &image).await,
            RegionCommand::Add {
                image,
                transformer,
                rect,
                status,
                label,
                comment,
            } => {
                commands::region::add(ctx, &image, transformer.as_deref(), rect, status, label, comment).await
            }
            RegionCommand::Update {
                image,
                number,
                transformer,
                rect,
                offset,
                handle,
                by,
                status,
                label,
                comment,
            } => {
                let resize = handle.zip(by);
                commands::region::update(
                    ctx,
                    &image,
                    number,
                    transformer.as_deref(),
                    rect,
                    offset,
                    resize,
                    status,
                    label,
                    comment,
                )
                .await
            }
            RegionCommand::Delete {
                image,
                number,
                transformer,
                yes,
            } => commands::region::delete(ctx, &image, number, transformer.as_deref(), yes).await,
        },

        Commands::Compare {
            transformer,
            inspection,
            index,
        } => commands::compare::show(ctx, &transformer, &inspection, index).await,

        Commands::Train {
            transformer,
            inspection,
            baseline,
            maintenance,
        } => commands::compare::train(ctx, &transformer, inspection.as_deref(), baseline, maintenance).await,

        Commands::Record { action } => match action {
            RecordCommand::Form {
                transformer,
                inspection,
                image,
            } => commands::record::form(ctx, &transformer, inspection.as_deref(), image.as_deref()).await,
            RecordCommand::Save {
                transformer,
                inspection,
                image,
                inspector,
                status,
                timestamp,
                readings,
                action,
                remarks,
            } => {
                let args = RecordArgs {
                    inspector,
                    status,
                    timestamp,
                    readings,
                    action,
                    remarks,
                };
                commands::record::save(ctx, &transformer, inspection.as_deref(), image.as_deref(), args).await
            }
            RecordCommand::List { transformer } => commands::record::list(ctx, &transformer).await,
            RecordCommand::Show { record } => commands::record::show(ctx, &record).await,
            RecordCommand::Pdf {
                transformer,
                record,
                output,
            } => commands::record::export_pdf(ctx, &transformer, &record, output).await,
            RecordCommand::Excel { transformer, output } => {
                commands::record::export_excel(ctx, &transformer, output).await
            }
        },

        Commands::Admin { action } => match action {
            AdminCommand::CreateUser {
                name,
                password,
                occupation,
            } => commands::account::create_user(ctx, &name, password, occupation.as_deref()).await,
        },

        Commands::Config {
            set_api_url,
            set_user,
            auto_train,
            show,
        } => commands::account::config(ctx, set_api_url, set_user, auto_train, show),
    }
}
