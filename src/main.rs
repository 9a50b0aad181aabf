use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use gworkspace_calendar::CalendarClient;
use gworkspace_core::{AppError, Config, WorkflowConfig};
use gworkspace_docs::{document_url, DocsClient, RgbColor};
use gworkspace_drive::{DriveClient, PermissionRole};

/// Clients sharing one access token for the whole run.
struct Clients {
    docs: DocsClient,
    drive: DriveClient,
    calendar: CalendarClient,
}

/// Attach what the workflow was doing to a helper failure.
fn step<T, E: Into<AppError>>(result: Result<T, E>, doing: &'static str) -> Result<T> {
    result.map_err(|e| anyhow::Error::new(e.into()).context(doing))
}

#[tokio::main]
async fn main() -> Result<()> {
    gworkspace_core::init()?;

    if let Err(e) = run().await {
        if let Some(app) = e.downcast_ref::<AppError>() {
            eprintln!("{}", app.user_message());
        }
        return Err(e);
    }

    tracing::info!("Workflow finished");
    Ok(())
}

async fn run() -> Result<()> {
    let (config, _validation) = step(Config::load_validated(), "Failed to load configuration")?;

    let token = step(
        gworkspace_auth::authenticate(&config.auth).await,
        "Failed to authenticate with Google",
    )?;

    let drive = DriveClient::with_base_url(&token.access_token, &config.endpoints.drive);
    let clients = Clients {
        docs: DocsClient::with_base_url(
            &token.access_token,
            &config.endpoints.docs,
            drive.clone(),
        ),
        calendar: step(
            CalendarClient::with_base_url(
                &token.access_token,
                &config.endpoints.calendar,
                &config.calendar,
                drive.clone(),
            ),
            "Invalid calendar settings",
        )?,
        drive,
    };

    run_workflow(&clients, &config.workflow).await
}

async fn run_workflow(clients: &Clients, workflow: &WorkflowConfig) -> Result<()> {
    let Clients {
        docs,
        drive,
        calendar,
    } = clients;
    let share_role: PermissionRole = workflow
        .share_role
        .parse()
        .context("Invalid workflow.share_role")?;

    let doc = step(
        docs.create_document(&workflow.document_title).await,
        "Unable to create document",
    )?;
    println!("Created document with ID: {}", doc.document_id);

    step(
        docs.add_text(&doc.document_id, &workflow.initial_text).await,
        "Unable to add text to document",
    )?;
    println!("Added text to the document.");

    let folder = step(
        drive.create_folder(&workflow.folder_name).await,
        "Unable to create folder",
    )?;
    println!("Created folder with ID: {}", folder.id);

    let filed_copy = step(
        drive.copy_file_to_folder(&doc.document_id, &folder.id).await,
        "Unable to copy document to folder",
    )?;
    println!("Copied document to folder with ID: {}", filed_copy.id);

    let start = Utc::now();
    let end = start + Duration::minutes(i64::from(workflow.event_duration_minutes));
    let event = step(
        calendar
            .create_event(
                &workflow.event_summary,
                &workflow.event_location,
                &workflow.event_description,
                start,
                end,
            )
            .await,
        "Unable to create calendar event",
    )?;
    println!("Created event with ID: {}", event.id);
    if let Some(link) = &event.hangout_link {
        println!("Meet link: {}", link);
    }

    step(
        calendar
            .add_attendees_to_event(&event.id, &workflow.attendee_emails)
            .await,
        "Unable to add attendees to event",
    )?;
    println!("Added attendees to the event.");

    step(
        calendar.attach_file_to_event(&event.id, &filed_copy.id).await,
        "Unable to attach file to event",
    )?;
    println!("Attached file to the event.");

    let copy = step(
        docs.make_copy(&doc.document_id, &workflow.copy_title).await,
        "Unable to copy document",
    )?;
    println!("Copied document ID: {}", copy.id);

    let content = step(
        docs.export_as_text(&doc.document_id).await,
        "Unable to export document",
    )?;
    println!("Document content:\n{}", content);

    step(docs.add_table(&copy.id, 3, 3).await, "Unable to add table")?;
    println!("Added table to the document.");

    step(
        docs.add_text_to_table_cell(&copy.id, 0, 1, 1, "Cell Text").await,
        "Unable to add text to table cell",
    )?;
    println!("Added text to table cell.");

    step(
        docs.set_color_to_table_cell(&copy.id, 0, 1, 1, RgbColor::RED.into())
            .await,
        "Unable to set color to table cell",
    )?;
    println!("Set color to table cell.");

    let end_index = step(
        docs.get_document_end_index(&copy.id).await,
        "Unable to get end index of copied document",
    )?;
    let original_url = document_url(&doc.document_id);
    step(
        docs.insert_text_with_link(&copy.id, &original_url, &original_url, end_index - 1)
            .await,
        "Unable to insert link into copied document",
    )?;
    println!("Inserted link to original document into copied document.");
    println!("You can view the copied document here: {}", document_url(&copy.id));

    step(
        drive
            .add_folder_permission(&folder.id, &workflow.share_email, share_role)
            .await,
        "Unable to add folder permission",
    )?;
    println!("Shared folder with {} as {}.", workflow.share_email, share_role);

    step(
        drive
            .remove_folder_permission(&folder.id, &workflow.share_email)
            .await,
        "Unable to remove folder permission",
    )?;
    println!("Removed {}'s permission from folder.", workflow.share_email);

    step(
        drive
            .rename_folder(&folder.id, &workflow.renamed_folder_name)
            .await,
        "Unable to rename folder",
    )?;
    println!("Folder renamed successfully.");

    step(
        drive.delete_file_or_folder(&doc.document_id).await,
        "Unable to delete document",
    )?;
    println!("Deleted document {}.", doc.document_id);

    Ok(())
}
