mod config;
mod db;
mod error;
mod export;
mod models;
mod session;
mod ui;

use std::io;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};
use tracing::info;
use tracing_subscriber::EnvFilter;
use tui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};

use crate::export::Exporter;
use crate::models::{Activity, Company, Contractor, MeasurementSheet, PurchaseOrder, Site, Worker};
use crate::session::Session;
use crate::ui::{
    form::{self, FormAction, FormState},
    list::{self, ListAction, ListScreen},
    login::{self, LoginAction, LoginState},
    menu::{self, MenuAction, MenuState, Section},
    order_wizard::{self, OrderWizardAction, OrderWizardState},
    sheet_wizard::{self, SheetWizardAction, SheetWizardState},
    site_wizard::{self, SiteWizardAction, SiteWizardState},
};

#[derive(Parser)]
#[command(name = "obra-manager", about = "Gestión de obras: empresas, pedidos y hojas de mediciones")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Exporta una hoja de mediciones sin abrir la interfaz
    Export {
        /// Identificador de la hoja
        #[arg(long)]
        sheet: i32,
        #[arg(long, value_enum, default_value_t = ExportFormat::Xlsx)]
        format: ExportFormat,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ExportFormat {
    Xlsx,
    Pdf,
    Both,
}

// Current screen. Wizard screens keep their state in the matching
// Option field of AppState.
enum AppScreen {
    Login,
    Menu,
    Companies,
    CompanyForm,
    Contractors,
    ContractorForm,
    Workers,
    WorkerForm,
    Sites,
    SiteWizard,
    Activities,
    ActivityForm,
    Orders,
    OrderWizard,
    Sheets(bool),
    SheetWizard(bool),
}

struct AppState {
    db: db::Database,
    session: Session,
    exporter: Exporter,
    site_title: String,
    screen: AppScreen,
    login_state: LoginState,
    menu_state: MenuState,
    companies: Option<ListScreen<Company>>,
    company_form: Option<(FormState, Company)>,
    contractors: Option<ListScreen<Contractor>>,
    contractor_form: Option<(FormState, Contractor)>,
    workers: Option<ListScreen<Worker>>,
    worker_form: Option<(FormState, Worker)>,
    sites: Option<ListScreen<Site>>,
    site_wizard: Option<SiteWizardState>,
    activities: Option<ListScreen<Activity>>,
    activity_form: Option<(FormState, Activity)>,
    orders: Option<ListScreen<PurchaseOrder>>,
    order_wizard: Option<OrderWizardState>,
    sheets: Option<ListScreen<MeasurementSheet>>,
    sheet_wizard: Option<SheetWizardState>,
}

impl AppState {
    fn new(db: db::Database, session: Session, exporter: Exporter, site_title: String) -> Self {
        let screen = if session.is_authenticated() {
            AppScreen::Menu
        } else {
            AppScreen::Login
        };

        Self {
            db,
            session,
            exporter,
            login_state: LoginState::new(&site_title),
            menu_state: MenuState::new(&site_title),
            site_title,
            screen,
            companies: None,
            company_form: None,
            contractors: None,
            contractor_form: None,
            workers: None,
            worker_form: None,
            sites: None,
            site_wizard: None,
            activities: None,
            activity_form: None,
            orders: None,
            order_wizard: None,
            sheets: None,
            sheet_wizard: None,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let config = config::init()?;
    let cli = Cli::parse();

    if let Some(Command::Export { sheet, format }) = cli.command {
        return export_headless(&config, sheet, format).await;
    }

    let db = db::init(&config).await?;
    info!("conexión con la base de datos establecida");

    let exporter = Exporter::new(&config.export_dir)?;
    let session = Session::init(&config);

    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app_state = AppState::new(db, session, exporter, config.site_title.clone());

    let result = run_app(&mut terminal, &mut app_state).await;

    terminal::disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = result {
        println!("Error: {}", err);
    }

    Ok(())
}

async fn export_headless(config: &config::Config, sheet_id: i32, format: ExportFormat) -> Result<()> {
    let db = db::init(config).await?;
    let sheet = db.get_sheet(sheet_id).await?;
    let exporter = Exporter::new(&config.export_dir)?;

    if matches!(format, ExportFormat::Xlsx | ExportFormat::Both) {
        let path = exporter.export_sheet_xlsx(&sheet)?;
        println!("{}", path.display());
    }
    if matches!(format, ExportFormat::Pdf | ExportFormat::Both) {
        let path = exporter.export_sheet_pdf(&sheet)?;
        println!("{}", path.display());
    }

    Ok(())
}

async fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut AppState) -> Result<()> {
    loop {
        terminal.draw(|f| match app.screen {
            AppScreen::Login => login::render_login(f, &mut app.login_state),
            AppScreen::Menu => menu::render_menu(f, &mut app.menu_state),
            AppScreen::Companies => {
                if let Some(state) = &mut app.companies {
                    list::render_list(f, state, "Empresas", |c| c.name.clone());
                }
            }
            AppScreen::CompanyForm => {
                if let Some((form, _)) = &mut app.company_form {
                    form::render_form(f, form);
                }
            }
            AppScreen::Contractors => {
                if let Some(state) = &mut app.contractors {
                    list::render_list(f, state, "Constructoras", |c| c.name.clone());
                }
            }
            AppScreen::ContractorForm => {
                if let Some((form, _)) = &mut app.contractor_form {
                    form::render_form(f, form);
                }
            }
            AppScreen::Workers => {
                if let Some(state) = &mut app.workers {
                    list::render_list(f, state, "Trabajadores", |w| {
                        format!("{} ({})", w.name, w.job)
                    });
                }
            }
            AppScreen::WorkerForm => {
                if let Some((form, _)) = &mut app.worker_form {
                    form::render_form(f, form);
                }
            }
            AppScreen::Sites => {
                if let Some(state) = &mut app.sites {
                    list::render_list(f, state, "Obras", |s| {
                        format!("{} - {}", s.name, s.town)
                    });
                }
            }
            AppScreen::SiteWizard => {
                if let Some(state) = &mut app.site_wizard {
                    site_wizard::render_site_wizard(f, state);
                }
            }
            AppScreen::Activities => {
                if let Some(state) = &mut app.activities {
                    list::render_list(f, state, "Actividades", |a| a.description.clone());
                }
            }
            AppScreen::ActivityForm => {
                if let Some((form, _)) = &mut app.activity_form {
                    form::render_form(f, form);
                }
            }
            AppScreen::Orders => {
                if let Some(state) = &mut app.orders {
                    list::render_list(f, state, "Hojas de Pedidos", |o| {
                        format!(
                            "{} | {} | {}",
                            o.order_date.format("%d/%m/%Y"),
                            o.description,
                            o.supplier
                        )
                    });
                }
            }
            AppScreen::OrderWizard => {
                if let Some(state) = &mut app.order_wizard {
                    order_wizard::render_order_wizard(f, state);
                }
            }
            AppScreen::Sheets(priced) => {
                if let Some(state) = &mut app.sheets {
                    let title = if priced {
                        "Hojas de Mediciones Precio"
                    } else {
                        "Hojas de Mediciones"
                    };
                    list::render_list(f, state, title, |s| {
                        format!(
                            "{} | {} | {}",
                            s.client_name,
                            s.sites_joined(),
                            s.sheet_date.format("%d/%m/%Y")
                        )
                    });
                }
            }
            AppScreen::SheetWizard(_) => {
                if let Some(state) = &mut app.sheet_wizard {
                    sheet_wizard::render_sheet_wizard(f, state);
                }
            }
        })?;

        let should_quit = match app.screen {
            AppScreen::Login => handle_login(app)?,
            AppScreen::Menu => handle_menu(app).await?,
            AppScreen::Companies => handle_companies(app).await?,
            AppScreen::CompanyForm => handle_company_form(app).await?,
            AppScreen::Contractors => handle_contractors(app).await?,
            AppScreen::ContractorForm => handle_contractor_form(app).await?,
            AppScreen::Workers => handle_workers(app).await?,
            AppScreen::WorkerForm => handle_worker_form(app).await?,
            AppScreen::Sites => handle_sites(app).await?,
            AppScreen::SiteWizard => handle_site_wizard(app).await?,
            AppScreen::Activities => handle_activities(app).await?,
            AppScreen::ActivityForm => handle_activity_form(app).await?,
            AppScreen::Orders => handle_orders(app).await?,
            AppScreen::OrderWizard => handle_order_wizard(app).await?,
            AppScreen::Sheets(priced) => handle_sheets(app, priced).await?,
            AppScreen::SheetWizard(priced) => handle_sheet_wizard(app, priced).await?,
        };

        if should_quit {
            break;
        }
    }

    Ok(())
}

fn handle_login(app: &mut AppState) -> Result<bool> {
    match login::handle_input(&mut app.login_state)? {
        Some(LoginAction::Exit) => return Ok(true),
        Some(LoginAction::Submit { username, password }) => {
            if app.session.login(&username, &password) {
                app.menu_state = MenuState::new(&app.site_title);
                app.screen = AppScreen::Menu;
            } else {
                app.login_state.error = Some("Credenciales incorrectas".to_string());
            }
        }
        None => {}
    }
    Ok(false)
}

async fn handle_menu(app: &mut AppState) -> Result<bool> {
    match menu::handle_input(&mut app.menu_state)? {
        Some(MenuAction::Exit) => return Ok(true),
        Some(MenuAction::Logout) => {
            app.session.logout();
            app.login_state = LoginState::new(&app.site_title);
            app.screen = AppScreen::Login;
        }
        Some(MenuAction::Open(section)) => match section {
            Section::Companies => open_companies(app).await,
            Section::Contractors => open_contractors(app).await,
            Section::Workers => open_workers(app).await,
            Section::Sites => open_sites(app).await,
            Section::Activities => open_activities(app).await,
            Section::PurchaseOrders => open_orders(app).await,
            Section::Sheets => open_sheets(app, false).await,
            Section::PricedSheets => open_sheets(app, true).await,
        },
        None => {}
    }
    Ok(false)
}

// Every section reload goes through its open_* helper; a load failure
// still opens the screen, with the error in the footer.

async fn open_companies(app: &mut AppState) {
    app.companies = Some(match app.db.list_companies().await {
        Ok(items) => ListScreen::new(items),
        Err(err) => ListScreen::new(Vec::new()).with_status(err.to_string()),
    });
    app.screen = AppScreen::Companies;
}

async fn open_contractors(app: &mut AppState) {
    app.contractors = Some(match app.db.list_contractors().await {
        Ok(items) => ListScreen::new(items),
        Err(err) => ListScreen::new(Vec::new()).with_status(err.to_string()),
    });
    app.screen = AppScreen::Contractors;
}

async fn open_workers(app: &mut AppState) {
    app.workers = Some(match app.db.list_workers().await {
        Ok(items) => ListScreen::new(items),
        Err(err) => ListScreen::new(Vec::new()).with_status(err.to_string()),
    });
    app.screen = AppScreen::Workers;
}

async fn open_sites(app: &mut AppState) {
    app.sites = Some(match app.db.list_sites().await {
        Ok(items) => ListScreen::new(items),
        Err(err) => ListScreen::new(Vec::new()).with_status(err.to_string()),
    });
    app.screen = AppScreen::Sites;
}

async fn open_activities(app: &mut AppState) {
    app.activities = Some(match app.db.list_activities().await {
        Ok(items) => ListScreen::new(items),
        Err(err) => ListScreen::new(Vec::new()).with_status(err.to_string()),
    });
    app.screen = AppScreen::Activities;
}

async fn open_orders(app: &mut AppState) {
    app.orders = Some(match app.db.list_purchase_orders().await {
        Ok(items) => ListScreen::new(items).exportable(),
        Err(err) => ListScreen::new(Vec::new()).with_status(err.to_string()),
    });
    app.screen = AppScreen::Orders;
}

async fn open_sheets(app: &mut AppState, priced: bool) {
    app.sheets = Some(match app.db.list_sheets(priced).await {
        Ok(items) => ListScreen::new(items).exportable(),
        Err(err) => ListScreen::new(Vec::new()).with_status(err.to_string()),
    });
    app.screen = AppScreen::Sheets(priced);
}

fn company_form(company: &Company) -> FormState {
    let title = if company.id == 0 {
        "Nueva empresa"
    } else {
        "Editar empresa"
    };
    FormState::with_values(
        title,
        vec![
            ("Nombre", company.name.clone()),
            ("Dirección", company.address.clone()),
            ("Teléfono", company.phone.clone()),
            ("Teléfono 2", company.phone2.clone()),
            ("Email", company.email.clone()),
        ],
    )
}

async fn handle_companies(app: &mut AppState) -> Result<bool> {
    let action = match app.companies.as_mut() {
        Some(state) => list::handle_input(state)?,
        None => None,
    };

    match action {
        Some(ListAction::Back) => app.screen = AppScreen::Menu,
        Some(ListAction::New) => {
            let company = Company::new();
            app.company_form = Some((company_form(&company), company));
            app.screen = AppScreen::CompanyForm;
        }
        Some(ListAction::Edit) => {
            let id = app.companies.as_ref().and_then(|s| s.selected()).map(|c| c.id);
            if let Some(id) = id {
                match app.db.get_company(id).await {
                    Ok(company) => {
                        app.company_form = Some((company_form(&company), company));
                        app.screen = AppScreen::CompanyForm;
                    }
                    Err(err) => {
                        if let Some(state) = app.companies.as_mut() {
                            state.status = Some(err.to_string());
                        }
                    }
                }
            }
        }
        Some(ListAction::Delete) => {
            let id = app.companies.as_ref().and_then(|s| s.selected()).map(|c| c.id);
            if let Some(id) = id {
                match app.db.delete_company(id).await {
                    Ok(()) => open_companies(app).await,
                    Err(err) => {
                        if let Some(state) = app.companies.as_mut() {
                            state.status = Some(err.to_string());
                        }
                    }
                }
            }
        }
        _ => {}
    }
    Ok(false)
}

async fn handle_company_form(app: &mut AppState) -> Result<bool> {
    let mut done = false;

    if let Some((form, original)) = app.company_form.as_mut() {
        match form::handle_input(form)? {
            Some(FormAction::Cancel) => done = true,
            Some(FormAction::Submit) => {
                let mut company = original.clone();
                company.name = form.value(0).to_string();
                company.address = form.value(1).to_string();
                company.phone = form.value(2).to_string();
                company.phone2 = form.value(3).to_string();
                company.email = form.value(4).to_string();

                let result = match company.validate() {
                    Ok(()) => {
                        if company.id == 0 {
                            app.db.create_company(&company).await.map(|_| ())
                        } else {
                            app.db.update_company(&company).await
                        }
                    }
                    Err(err) => Err(err),
                };

                match result {
                    Ok(()) => done = true,
                    Err(err) => form.error = Some(err.to_string()),
                }
            }
            None => {}
        }
    }

    if done {
        app.company_form = None;
        open_companies(app).await;
    }
    Ok(false)
}

fn contractor_form(contractor: &Contractor) -> FormState {
    let title = if contractor.id == 0 {
        "Nueva constructora"
    } else {
        "Editar constructora"
    };
    FormState::with_values(
        title,
        vec![
            ("Nombre", contractor.name.clone()),
            ("Dirección", contractor.address.clone()),
            ("Teléfono", contractor.phone.clone()),
            ("Email", contractor.email.clone()),
        ],
    )
}

async fn handle_contractors(app: &mut AppState) -> Result<bool> {
    let action = match app.contractors.as_mut() {
        Some(state) => list::handle_input(state)?,
        None => None,
    };

    match action {
        Some(ListAction::Back) => app.screen = AppScreen::Menu,
        Some(ListAction::New) => {
            let contractor = Contractor::new();
            app.contractor_form = Some((contractor_form(&contractor), contractor));
            app.screen = AppScreen::ContractorForm;
        }
        Some(ListAction::Edit) => {
            let selected = app.contractors.as_ref().and_then(|s| s.selected().cloned());
            if let Some(contractor) = selected {
                app.contractor_form = Some((contractor_form(&contractor), contractor));
                app.screen = AppScreen::ContractorForm;
            }
        }
        Some(ListAction::Delete) => {
            let id = app
                .contractors
                .as_ref()
                .and_then(|s| s.selected())
                .map(|c| c.id);
            if let Some(id) = id {
                match app.db.delete_contractor(id).await {
                    Ok(()) => open_contractors(app).await,
                    Err(err) => {
                        if let Some(state) = app.contractors.as_mut() {
                            state.status = Some(err.to_string());
                        }
                    }
                }
            }
        }
        _ => {}
    }
    Ok(false)
}

async fn handle_contractor_form(app: &mut AppState) -> Result<bool> {
    let mut done = false;

    if let Some((form, original)) = app.contractor_form.as_mut() {
        match form::handle_input(form)? {
            Some(FormAction::Cancel) => done = true,
            Some(FormAction::Submit) => {
                let mut contractor = original.clone();
                contractor.name = form.value(0).to_string();
                contractor.address = form.value(1).to_string();
                contractor.phone = form.value(2).to_string();
                contractor.email = form.value(3).to_string();

                let result = match contractor.validate() {
                    Ok(()) => {
                        if contractor.id == 0 {
                            app.db.create_contractor(&contractor).await.map(|_| ())
                        } else {
                            app.db.update_contractor(&contractor).await
                        }
                    }
                    Err(err) => Err(err),
                };

                match result {
                    Ok(()) => done = true,
                    Err(err) => form.error = Some(err.to_string()),
                }
            }
            None => {}
        }
    }

    if done {
        app.contractor_form = None;
        open_contractors(app).await;
    }
    Ok(false)
}

fn worker_form(worker: &Worker) -> FormState {
    let title = if worker.id == 0 {
        "Nuevo trabajador"
    } else {
        "Editar trabajador"
    };
    FormState::with_values(
        title,
        vec![
            ("Nombre", worker.name.clone()),
            ("Alias", worker.alias.clone()),
            ("Dirección", worker.address.clone()),
            ("Teléfono", worker.phone.clone()),
            ("Puesto", worker.job.clone()),
            ("Empresa", worker.company.clone()),
            ("Situación", worker.work_status.clone()),
        ],
    )
}

async fn handle_workers(app: &mut AppState) -> Result<bool> {
    let action = match app.workers.as_mut() {
        Some(state) => list::handle_input(state)?,
        None => None,
    };

    match action {
        Some(ListAction::Back) => app.screen = AppScreen::Menu,
        Some(ListAction::New) => {
            let worker = Worker::new();
            app.worker_form = Some((worker_form(&worker), worker));
            app.screen = AppScreen::WorkerForm;
        }
        Some(ListAction::Edit) => {
            let selected = app.workers.as_ref().and_then(|s| s.selected().cloned());
            if let Some(worker) = selected {
                app.worker_form = Some((worker_form(&worker), worker));
                app.screen = AppScreen::WorkerForm;
            }
        }
        Some(ListAction::Delete) => {
            let id = app.workers.as_ref().and_then(|s| s.selected()).map(|w| w.id);
            if let Some(id) = id {
                match app.db.delete_worker(id).await {
                    Ok(()) => open_workers(app).await,
                    Err(err) => {
                        if let Some(state) = app.workers.as_mut() {
                            state.status = Some(err.to_string());
                        }
                    }
                }
            }
        }
        _ => {}
    }
    Ok(false)
}

async fn handle_worker_form(app: &mut AppState) -> Result<bool> {
    let mut done = false;

    if let Some((form, original)) = app.worker_form.as_mut() {
        match form::handle_input(form)? {
            Some(FormAction::Cancel) => done = true,
            Some(FormAction::Submit) => {
                let mut worker = original.clone();
                worker.name = form.value(0).to_string();
                worker.alias = form.value(1).to_string();
                worker.address = form.value(2).to_string();
                worker.phone = form.value(3).to_string();
                worker.job = form.value(4).to_string();
                worker.company = form.value(5).to_string();
                worker.work_status = form.value(6).to_string();

                let result = match worker.validate() {
                    Ok(()) => {
                        if worker.id == 0 {
                            app.db.create_worker(&worker).await.map(|_| ())
                        } else {
                            app.db.update_worker(&worker).await
                        }
                    }
                    Err(err) => Err(err),
                };

                match result {
                    Ok(()) => done = true,
                    Err(err) => form.error = Some(err.to_string()),
                }
            }
            None => {}
        }
    }

    if done {
        app.worker_form = None;
        open_workers(app).await;
    }
    Ok(false)
}

async fn handle_sites(app: &mut AppState) -> Result<bool> {
    let action = match app.sites.as_mut() {
        Some(state) => list::handle_input(state)?,
        None => None,
    };

    match action {
        Some(ListAction::Back) => app.screen = AppScreen::Menu,
        Some(ListAction::New) => {
            open_site_wizard(app, Site::new(), Vec::new()).await;
        }
        Some(ListAction::Edit) => {
            let id = app.sites.as_ref().and_then(|s| s.selected()).map(|s| s.id);
            if let Some(id) = id {
                match app.db.get_site(id).await {
                    Ok(site) => {
                        let company_ids =
                            app.db.site_company_ids(site.id).await.unwrap_or_default();
                        open_site_wizard(app, site, company_ids).await;
                    }
                    Err(err) => {
                        if let Some(state) = app.sites.as_mut() {
                            state.status = Some(err.to_string());
                        }
                    }
                }
            }
        }
        Some(ListAction::Delete) => {
            let id = app.sites.as_ref().and_then(|s| s.selected()).map(|s| s.id);
            if let Some(id) = id {
                match app.db.delete_site(id).await {
                    Ok(()) => open_sites(app).await,
                    Err(err) => {
                        if let Some(state) = app.sites.as_mut() {
                            state.status = Some(err.to_string());
                        }
                    }
                }
            }
        }
        _ => {}
    }
    Ok(false)
}

async fn open_site_wizard(app: &mut AppState, site: Site, company_ids: Vec<i32>) {
    let companies = app.db.list_companies().await.unwrap_or_default();
    app.site_wizard = Some(SiteWizardState::new(site, companies, company_ids));
    app.screen = AppScreen::SiteWizard;
}

async fn handle_site_wizard(app: &mut AppState) -> Result<bool> {
    let mut done = false;

    if let Some(state) = app.site_wizard.as_mut() {
        match site_wizard::handle_input(state)? {
            Some(SiteWizardAction::Cancel) => done = true,
            Some(SiteWizardAction::Save(site, company_ids)) => {
                let result = match site.validate() {
                    Ok(()) => app.db.save_site(&site, &company_ids).await.map(|_| ()),
                    Err(err) => Err(err),
                };
                match result {
                    Ok(()) => done = true,
                    Err(err) => state.error = Some(err.to_string()),
                }
            }
            None => {}
        }
    }

    if done {
        app.site_wizard = None;
        open_sites(app).await;
    }
    Ok(false)
}

fn activity_form(activity: &Activity) -> FormState {
    let title = if activity.id == 0 {
        "Nueva actividad"
    } else {
        "Editar actividad"
    };
    FormState::with_values(title, vec![("Descripción", activity.description.clone())])
}

async fn handle_activities(app: &mut AppState) -> Result<bool> {
    let action = match app.activities.as_mut() {
        Some(state) => list::handle_input(state)?,
        None => None,
    };

    match action {
        Some(ListAction::Back) => app.screen = AppScreen::Menu,
        Some(ListAction::New) => {
            let activity = Activity::new();
            app.activity_form = Some((activity_form(&activity), activity));
            app.screen = AppScreen::ActivityForm;
        }
        Some(ListAction::Edit) => {
            let selected = app.activities.as_ref().and_then(|s| s.selected().cloned());
            if let Some(activity) = selected {
                app.activity_form = Some((activity_form(&activity), activity));
                app.screen = AppScreen::ActivityForm;
            }
        }
        Some(ListAction::Delete) => {
            let id = app
                .activities
                .as_ref()
                .and_then(|s| s.selected())
                .map(|a| a.id);
            if let Some(id) = id {
                match app.db.delete_activity(id).await {
                    Ok(()) => open_activities(app).await,
                    Err(err) => {
                        if let Some(state) = app.activities.as_mut() {
                            state.status = Some(err.to_string());
                        }
                    }
                }
            }
        }
        _ => {}
    }
    Ok(false)
}

async fn handle_activity_form(app: &mut AppState) -> Result<bool> {
    let mut done = false;

    if let Some((form, original)) = app.activity_form.as_mut() {
        match form::handle_input(form)? {
            Some(FormAction::Cancel) => done = true,
            Some(FormAction::Submit) => {
                let mut activity = original.clone();
                activity.description = form.value(0).to_string();

                let result = match activity.validate() {
                    Ok(()) => {
                        if activity.id == 0 {
                            app.db.create_activity(&activity).await.map(|_| ())
                        } else {
                            app.db.update_activity(&activity).await
                        }
                    }
                    Err(err) => Err(err),
                };

                match result {
                    Ok(()) => done = true,
                    Err(err) => form.error = Some(err.to_string()),
                }
            }
            None => {}
        }
    }

    if done {
        app.activity_form = None;
        open_activities(app).await;
    }
    Ok(false)
}

async fn handle_orders(app: &mut AppState) -> Result<bool> {
    let action = match app.orders.as_mut() {
        Some(state) => list::handle_input(state)?,
        None => None,
    };

    match action {
        Some(ListAction::Back) => app.screen = AppScreen::Menu,
        Some(ListAction::New) => {
            app.order_wizard = Some(OrderWizardState::new(PurchaseOrder::new()));
            app.screen = AppScreen::OrderWizard;
        }
        Some(ListAction::Edit) => {
            let id = app.orders.as_ref().and_then(|s| s.selected()).map(|o| o.id);
            if let Some(id) = id {
                match app.db.get_purchase_order(id).await {
                    Ok(order) => {
                        app.order_wizard = Some(OrderWizardState::new(order));
                        app.screen = AppScreen::OrderWizard;
                    }
                    Err(err) => {
                        if let Some(state) = app.orders.as_mut() {
                            state.status = Some(err.to_string());
                        }
                    }
                }
            }
        }
        Some(ListAction::Delete) => {
            let id = app.orders.as_ref().and_then(|s| s.selected()).map(|o| o.id);
            if let Some(id) = id {
                match app.db.delete_purchase_order(id).await {
                    Ok(()) => open_orders(app).await,
                    Err(err) => {
                        if let Some(state) = app.orders.as_mut() {
                            state.status = Some(err.to_string());
                        }
                    }
                }
            }
        }
        Some(ListAction::ExportXlsx) | Some(ListAction::ExportPdf) => {
            let xlsx = matches!(action, Some(ListAction::ExportXlsx));
            let selected = app.orders.as_ref().and_then(|s| s.selected().cloned());
            if let Some(order) = selected {
                let result = if xlsx {
                    app.exporter.export_order_xlsx(&order)
                } else {
                    app.exporter.export_order_pdf(&order)
                };
                if let Some(state) = app.orders.as_mut() {
                    state.status = Some(match result {
                        Ok(path) => format!("Exportado: {}", path.display()),
                        Err(err) => err.to_string(),
                    });
                }
            }
        }
        None => {}
    }
    Ok(false)
}

async fn handle_order_wizard(app: &mut AppState) -> Result<bool> {
    let mut done = false;

    if let Some(state) = app.order_wizard.as_mut() {
        match order_wizard::handle_input(state)? {
            Some(OrderWizardAction::Cancel) => done = true,
            Some(OrderWizardAction::Save(order)) => {
                let result = match order.validate() {
                    Ok(()) => {
                        if order.id == 0 {
                            app.db.create_purchase_order(&order).await.map(|_| ())
                        } else {
                            app.db.update_purchase_order(&order).await
                        }
                    }
                    Err(err) => Err(err),
                };
                match result {
                    Ok(()) => done = true,
                    Err(err) => state.error = Some(err.to_string()),
                }
            }
            None => {}
        }
    }

    if done {
        app.order_wizard = None;
        open_orders(app).await;
    }
    Ok(false)
}

async fn handle_sheets(app: &mut AppState, priced: bool) -> Result<bool> {
    let action = match app.sheets.as_mut() {
        Some(state) => list::handle_input(state)?,
        None => None,
    };

    match action {
        Some(ListAction::Back) => app.screen = AppScreen::Menu,
        Some(ListAction::New) => {
            open_sheet_wizard(app, MeasurementSheet::new(priced), priced).await;
        }
        Some(ListAction::Edit) => {
            let id = app.sheets.as_ref().and_then(|s| s.selected()).map(|s| s.id);
            if let Some(id) = id {
                match app.db.get_sheet(id).await {
                    Ok(sheet) => {
                        open_sheet_wizard(app, sheet, priced).await;
                    }
                    Err(err) => {
                        if let Some(state) = app.sheets.as_mut() {
                            state.status = Some(err.to_string());
                        }
                    }
                }
            }
        }
        Some(ListAction::Delete) => {
            let id = app.sheets.as_ref().and_then(|s| s.selected()).map(|s| s.id);
            if let Some(id) = id {
                match app.db.delete_sheet(id).await {
                    Ok(()) => open_sheets(app, priced).await,
                    Err(err) => {
                        if let Some(state) = app.sheets.as_mut() {
                            state.status = Some(err.to_string());
                        }
                    }
                }
            }
        }
        Some(ListAction::ExportXlsx) | Some(ListAction::ExportPdf) => {
            let xlsx = matches!(action, Some(ListAction::ExportXlsx));
            let id = app.sheets.as_ref().and_then(|s| s.selected()).map(|s| s.id);
            if let Some(id) = id {
                // Exports always use the stored sheet with its lines
                // normalized, not the list row.
                let result = match app.db.get_sheet(id).await {
                    Ok(sheet) => {
                        if xlsx {
                            app.exporter.export_sheet_xlsx(&sheet)
                        } else {
                            app.exporter.export_sheet_pdf(&sheet)
                        }
                    }
                    Err(err) => Err(err),
                };
                if let Some(state) = app.sheets.as_mut() {
                    state.status = Some(match result {
                        Ok(path) => format!("Exportado: {}", path.display()),
                        Err(err) => err.to_string(),
                    });
                }
            }
        }
        None => {}
    }
    Ok(false)
}

async fn open_sheet_wizard(app: &mut AppState, sheet: MeasurementSheet, priced: bool) {
    let activities = app
        .db
        .list_activities()
        .await
        .unwrap_or_default()
        .into_iter()
        .map(|a| a.description)
        .collect();
    app.sheet_wizard = Some(SheetWizardState::new(sheet, activities));
    app.screen = AppScreen::SheetWizard(priced);
}

async fn handle_sheet_wizard(app: &mut AppState, priced: bool) -> Result<bool> {
    let mut done = false;

    if let Some(state) = app.sheet_wizard.as_mut() {
        match sheet_wizard::handle_input(state)? {
            Some(SheetWizardAction::Cancel) => done = true,
            Some(SheetWizardAction::Save(sheet)) => match app.db.save_sheet(&sheet).await {
                Ok(_) => done = true,
                Err(err) => state.error = Some(err.to_string()),
            },
            None => {}
        }
    }

    if done {
        app.sheet_wizard = None;
        open_sheets(app, priced).await;
    }
    Ok(false)
}
