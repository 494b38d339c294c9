mod config;
mod db;
mod error;
mod models;
mod session;
mod store;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use config::PortalConfig;
use db::{Database, KeyValueStore, MemoryStore};
use error::PortalError;
use models::{Audience, User, UserType, Verification};
use session::Session;
use std::io::{BufRead, Write};
use store::{Store, DEFAULT_CERTIFICATE_TYPE};

const LOGIN_HINT: &str = "Invalid credentials. Try: drishti@example.com / password";

#[derive(Parser)]
#[command(name = "adhyayan")]
#[command(about = "Alumni and certificate portal - login, search, certificates, notifications")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Show debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Keep the session in memory instead of the session database
    #[arg(long, global = true)]
    ephemeral: bool,
}

/// One line typed into `adhyayan shell`.
#[derive(Parser)]
#[command(no_binary_name = true, name = "adhyayan")]
struct ShellLine {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and remember the session
    Login {
        /// Email address (admins: any address containing "admin" or "iit")
        email: String,

        /// Password (accepted but not checked)
        #[arg(short, long, default_value = "")]
        password: String,

        /// Account type (student, alumni, admin, organization)
        #[arg(short = 't', long = "as", default_value = "student")]
        user_type: UserType,
    },

    /// Forget the saved session
    Logout,

    /// Show who is logged in
    Whoami,

    /// Show the dashboard for the logged-in user
    Dashboard,

    /// Search universities by name, code, state or region
    Search {
        /// Search text
        query: String,
    },

    /// List all universities
    Universities,

    /// Certificate upload, approval and verification
    Cert {
        #[command(subcommand)]
        command: CertCommands,
    },

    /// Send and read notifications
    Notify {
        #[command(subcommand)]
        command: NotifyCommands,
    },

    /// List upcoming events
    Events,

    /// List alumni open to mentoring
    Mentors,

    /// Turn your mentorship availability on or off (alumni)
    Mentorship {
        state: Toggle,
    },

    /// Run several commands against one portal session
    Shell,
}

#[derive(Subcommand)]
enum CertCommands {
    /// Upload a certificate (students)
    Upload {
        /// Certificate type
        #[arg(short = 't', long = "type", default_value = DEFAULT_CERTIFICATE_TYPE)]
        certificate_type: String,
    },

    /// List your certificates (students)
    List,

    /// List certificates awaiting approval (admin)
    Pending,

    /// Approve a certificate (admin)
    Approve {
        /// Certificate ID, e.g. CERT002
        id: String,
    },

    /// Reject a certificate (admin)
    Reject {
        /// Certificate ID
        id: String,

        /// Why it was rejected
        reason: String,
    },

    /// Check whether a certificate is genuine
    Verify {
        /// Certificate ID
        id: String,
    },
}

#[derive(Subcommand)]
enum NotifyCommands {
    /// Send a notification (admin)
    Send {
        #[arg(short, long)]
        title: String,

        #[arg(short, long)]
        content: String,

        /// Who receives it (students, alumni, admin, organizations)
        #[arg(short, long, default_value = "students")]
        audience: Audience,
    },

    /// List notifications
    List {
        /// Only this audience (defaults to your own when logged in)
        #[arg(short, long)]
        audience: Option<Audience>,

        /// Show every audience
        #[arg(long)]
        all: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Toggle {
    On,
    Off,
}

struct App {
    config: PortalConfig,
    store: Store,
    kv: Box<dyn KeyValueStore>,
    session: Session,
}

impl App {
    fn open(config: PortalConfig, ephemeral: bool) -> Result<Self> {
        let kv: Box<dyn KeyValueStore> = if ephemeral {
            Box::new(MemoryStore::default())
        } else {
            let db = Database::open(config.session.db_path.as_deref())
                .context("Failed to open session database")?;
            tracing::debug!(path = %db.path().display(), "session database opened");
            Box::new(db)
        };
        let session = Session::restore(kv.as_ref(), config.session.key.clone())
            .context("Failed to read saved session")?;

        Ok(Self {
            config,
            store: Store::seeded(),
            kv,
            session,
        })
    }

    fn date(&self, date: NaiveDate) -> String {
        self.config
            .display
            .format_date(date)
            .unwrap_or_else(|| date.format("%Y-%m-%d").to_string())
    }

    fn print_wrapped(&self, text: &str, indent: &str) {
        let width = self.config.display.wrap_width.saturating_sub(indent.len()).max(1);
        for line in textwrap::wrap(text, width) {
            println!("{indent}{line}");
        }
    }
}

fn init_tracing(quiet: bool, verbose: bool) -> Result<()> {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };

    let filter = tracing_subscriber::EnvFilter::try_from_env("ADHYAYAN_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.quiet, cli.verbose)?;

    let config = PortalConfig::load().context("Failed to load configuration")?;
    let mut app = App::open(config, cli.ephemeral)?;

    match cli.command {
        Commands::Shell => run_shell(&mut app),
        command => {
            if let Err(err) = run(&mut app, command) {
                if let Some(message) = user_message(&err) {
                    eprintln!("{message}");
                    std::process::exit(1);
                }
                return Err(err);
            }
            Ok(())
        }
    }
}

/// The one-line message for errors the user can fix, or `None` for real failures.
fn user_message(err: &anyhow::Error) -> Option<String> {
    let portal = err.downcast_ref::<PortalError>()?;
    if !portal.is_user_facing() {
        return None;
    }
    Some(match portal {
        PortalError::Validation(msg) => msg.clone(),
        PortalError::AuthFailure { email, user_type } if email.is_empty() => {
            format!("Please log in as {user_type} first.")
        }
        PortalError::AuthFailure { email, user_type } => {
            format!("{email} is not signed in as {user_type}.")
        }
        other => other.to_string(),
    })
}

fn run_shell(app: &mut App) -> Result<()> {
    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();

    println!("adhyayan shell - type 'help' for commands, 'exit' to leave.");
    loop {
        let prompt = app
            .session
            .user()
            .map_or_else(|| "guest".to_string(), |u| u.email().to_string());
        print!("{prompt}> ");
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            println!();
            break;
        }

        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "exit" || line == "quit" {
            break;
        }

        let words = match split_line(line) {
            Ok(words) => words,
            Err(e) => {
                eprintln!("{e}");
                continue;
            }
        };

        let parsed = match ShellLine::try_parse_from(words) {
            Ok(parsed) => parsed,
            Err(e) => {
                // Covers `help` and `--help` as well as genuine mistakes.
                e.print()?;
                continue;
            }
        };

        if matches!(parsed.command, Commands::Shell) {
            println!("Already in the shell.");
            continue;
        }

        if let Err(err) = run(app, parsed.command) {
            match user_message(&err) {
                Some(message) => eprintln!("{message}"),
                None => eprintln!("Error: {err:#}"),
            }
        }
    }

    Ok(())
}

/// Split a shell line into words, honouring double quotes.
fn split_line(line: &str) -> Result<Vec<String>, PortalError> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut in_quotes = false;

    for c in line.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                in_word = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            c => {
                current.push(c);
                in_word = true;
            }
        }
    }

    if in_quotes {
        return Err(PortalError::Validation("Unterminated quote.".to_string()));
    }
    if in_word {
        words.push(current);
    }
    Ok(words)
}

fn run(app: &mut App, command: Commands) -> Result<()> {
    match command {
        Commands::Login {
            email,
            password,
            user_type,
        } => {
            let user = match app.session.login(
                &app.store,
                app.kv.as_mut(),
                &email,
                &password,
                user_type,
            ) {
                Ok(user) => user,
                Err(PortalError::AuthFailure { .. }) => {
                    return Err(PortalError::Validation(LOGIN_HINT.to_string()).into());
                }
                Err(e) => return Err(e.into()),
            };
            println!("Login successful! Welcome, {}.", user.name());
            println!("Dashboard: {}", app.session.page());
        }

        Commands::Logout => {
            if !app.session.is_authenticated() {
                println!("Not logged in.");
                return Ok(());
            }
            app.session.logout(app.kv.as_mut())?;
            println!("Logged out successfully.");
        }

        Commands::Whoami => match app.session.user() {
            Some(user) => {
                println!("{} <{}>", user.name(), user.email());
                println!("Type: {}", user.user_type());
                println!("Page: {}", app.session.page());
            }
            None => println!("Not logged in."),
        },

        Commands::Dashboard => show_dashboard(app)?,

        Commands::Search { query } => {
            if query.trim().is_empty() {
                return Err(PortalError::Validation("Please enter a search query.".to_string()).into());
            }
            let results = app.store.search_universities(&query);
            if results.is_empty() {
                println!("No universities found.");
            } else {
                print_universities(&results);
            }
        }

        Commands::Universities => {
            let all: Vec<_> = app.store.universities().iter().collect();
            print_universities(&all);
        }

        Commands::Cert { command } => run_cert(app, command)?,

        Commands::Notify { command } => run_notify(app, command)?,

        Commands::Events => {
            let events = app.store.events();
            if events.is_empty() {
                println!("No events scheduled.");
            }
            for event in events {
                let organizer = app
                    .store
                    .organizer(event)
                    .map_or("Unknown", |o| o.name.as_str());
                println!("#{} {}", event.id, event.title);
                println!(
                    "  {} | {} | up to {} participants | by {}",
                    app.date(event.date),
                    event.location,
                    event.max_participants,
                    organizer
                );
                app.print_wrapped(&event.description, "  ");
            }
        }

        Commands::Mentors => {
            let mentors = app.store.mentors();
            if mentors.is_empty() {
                println!("No mentors available.");
            } else {
                println!("{:<20} {:<12} {:<6} {}", "NAME", "COMPANY", "CLASS", "EXPERTISE");
                println!("{}", "-".repeat(72));
                for alumni in mentors {
                    println!(
                        "{:<20} {:<12} {:<6} {}",
                        truncate(&alumni.name, 18),
                        truncate(&alumni.current_company, 10),
                        alumni.graduation_year,
                        alumni.expertise.join(", ")
                    );
                }
            }
        }

        Commands::Mentorship { state } => {
            let alumni_id = app.session.require(UserType::Alumni)?.id();
            let available = matches!(state, Toggle::On);
            app.store
                .set_mentorship(alumni_id, available)
                .ok_or_else(|| PortalError::NotFound {
                    entity: "Alumni",
                    id: alumni_id.to_string(),
                })?;
            println!(
                "Mentorship availability {}.",
                if available { "enabled" } else { "disabled" }
            );
        }

        Commands::Shell => println!("Already in the shell."),
    }

    Ok(())
}

fn run_cert(app: &mut App, command: CertCommands) -> Result<()> {
    match command {
        CertCommands::Upload { certificate_type } => {
            let student_id = app.session.require(UserType::Student)?.id();
            let cert = app.store.add_certificate(student_id, &certificate_type);
            println!("Certificate {} uploaded successfully! Awaiting approval.", cert.id);
        }

        CertCommands::List => {
            let student_id = app.session.require(UserType::Student)?.id();
            print_student_certificates(app, student_id);
        }

        CertCommands::Pending => {
            app.session.require(UserType::Admin)?;
            print_pending_approvals(app);
        }

        CertCommands::Approve { id } => {
            app.session.require(UserType::Admin)?;
            match app.store.approve_certificate(&id) {
                Some(cert) => println!("Certificate {} approved successfully!", cert.id),
                None => println!("Certificate {id} not found."),
            }
        }

        CertCommands::Reject { id, reason } => {
            app.session.require(UserType::Admin)?;
            if reason.trim().is_empty() {
                return Err(PortalError::Validation("Please enter a rejection reason.".to_string()).into());
            }
            match app.store.reject_certificate(&id, &reason) {
                Some(cert) => println!("Certificate {} rejected.", cert.id),
                None => println!("Certificate {id} not found."),
            }
        }

        CertCommands::Verify { id } => {
            let id = id.trim();
            if id.is_empty() {
                return Err(PortalError::Validation("Please enter a certificate ID.".to_string()).into());
            }
            match app.store.verify_certificate(id) {
                Verification::Approved {
                    certificate_type,
                    student_name,
                    university_name,
                    approval_date,
                } => {
                    println!("✓ Certificate Verified");
                    println!("Type: {certificate_type}");
                    println!("Student: {}", student_name.as_deref().unwrap_or("Unknown"));
                    println!("University: {}", university_name.as_deref().unwrap_or("Unknown"));
                    println!(
                        "Approved Date: {}",
                        approval_date.map_or_else(|| "Unknown".to_string(), |d| app.date(d))
                    );
                }
                Verification::Pending => {
                    println!("⚠ Certificate Pending Approval");
                    println!("This certificate is still under review by the institution.");
                }
                Verification::Rejected { reason } => {
                    println!("✗ Certificate Rejected");
                    println!("This certificate was rejected by the institution.");
                    println!("Reason: {}", reason.as_deref().unwrap_or("Not specified"));
                }
                Verification::NotFound { id } => {
                    println!("✗ Certificate Not Found");
                    println!("No certificate found with ID: {id}");
                }
            }
        }
    }

    Ok(())
}

fn run_notify(app: &mut App, command: NotifyCommands) -> Result<()> {
    match command {
        NotifyCommands::Send {
            title,
            content,
            audience,
        } => {
            app.session.require(UserType::Admin)?;
            app.store.add_notification(&title, &content, audience)?;
            println!("Notification sent to {audience}!");
        }

        NotifyCommands::List { audience, all } => {
            let audience = if all {
                None
            } else {
                audience.or_else(|| app.session.user_type().map(Audience::for_user_type))
            };
            let notifications: Vec<_> = match audience {
                Some(audience) => app.store.notifications_for(audience),
                None => app.store.notifications().iter().collect(),
            };

            if notifications.is_empty() {
                println!("No notifications.");
            }
            for n in notifications {
                println!("#{} {} [{}] {}", n.id, app.date(n.sent_at), n.audience, n.title);
                app.print_wrapped(&n.content, "    ");
            }
        }
    }

    Ok(())
}

fn show_dashboard(app: &App) -> Result<()> {
    let Some(user) = app.session.user() else {
        println!("Not logged in. Use 'login' to open a dashboard.");
        return Ok(());
    };

    println!("== {} ({}) ==", user.name(), app.session.page());
    match user {
        User::Student(student) => {
            let university = app
                .store
                .university(student.university_id)
                .map_or("Unknown", |u| u.name.as_str());
            println!("{} - {}, {}", university, student.course, student.year);
            println!("Credit score: {}", student.credit_score);
            println!();
            print_student_certificates(app, student.id);
        }
        User::Alumni(alumni) => {
            println!(
                "Class of {} - {}",
                alumni.graduation_year, alumni.current_company
            );
            println!("Expertise: {}", alumni.expertise.join(", "));
            let available = app
                .store
                .mentors()
                .iter()
                .any(|a| a.id == alumni.id);
            println!(
                "Mentorship: {}",
                if available { "available" } else { "not available" }
            );
        }
        User::Admin(_) => print_pending_approvals(app),
        User::Organization(org) => {
            println!("{} - {} ({})", org.industry, org.website, org.verification_status);
            let hosted: Vec<_> = app
                .store
                .events()
                .iter()
                .filter(|e| e.organizer_id == org.id)
                .collect();
            println!("Events hosted: {}", hosted.len());
            for event in hosted {
                println!("  #{} {} ({})", event.id, event.title, app.date(event.date));
            }
        }
    }

    let feed = app
        .store
        .notifications_for(Audience::for_user_type(user.user_type()));
    if !feed.is_empty() {
        println!("\nNotifications:");
        for n in feed {
            println!("  {} - {}", app.date(n.sent_at), n.title);
        }
    }

    Ok(())
}

fn print_universities(universities: &[&models::University]) {
    println!("{:<40} {:<6} {:<12} {:<6} {:>6} {:>8} {:>6}", "NAME", "CODE", "STATE", "REGION", "PLACED", "FACULTY", "DEPTS");
    println!("{}", "-".repeat(92));
    for uni in universities {
        println!(
            "{:<40} {:<6} {:<12} {:<6} {:>6} {:>8} {:>6}",
            truncate(&uni.name, 38),
            uni.code,
            uni.state,
            uni.region,
            uni.placement_rate,
            uni.faculties,
            uni.departments
        );
    }
}

fn print_student_certificates(app: &App, student_id: u32) {
    let certs = app.store.certificates_for_student(student_id);
    if certs.is_empty() {
        println!("No certificates uploaded yet.");
        return;
    }
    println!("{:<8} {:<26} {:<10} {:<14}", "ID", "TYPE", "STATUS", "UPLOADED");
    println!("{}", "-".repeat(60));
    for cert in certs {
        println!(
            "{:<8} {:<26} {:<10} {:<14}",
            cert.id,
            truncate(&cert.certificate_type, 24),
            cert.status,
            app.date(cert.upload_date)
        );
    }
}

fn print_pending_approvals(app: &App) {
    let queue = app.store.pending_approvals();
    if queue.is_empty() {
        println!("No pending certificate approvals.");
        return;
    }
    println!("{:<8} {:<26} {:<20} {:<14}", "ID", "TYPE", "STUDENT", "SUBMITTED");
    println!("{}", "-".repeat(70));
    for (cert, student) in queue {
        println!(
            "{:<8} {:<26} {:<20} {:<14}",
            cert.id,
            truncate(&cert.certificate_type, 24),
            truncate(student.map_or("Unknown", |s| s.name.as_str()), 18),
            app.date(cert.upload_date)
        );
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn app() -> App {
        App::open(PortalConfig::default(), true).unwrap()
    }

    #[test]
    fn test_split_line_quotes() {
        assert_eq!(
            split_line(r#"notify send --title "Exam dates" --content "Finals in May""#).unwrap(),
            vec!["notify", "send", "--title", "Exam dates", "--content", "Finals in May"]
        );
        assert_eq!(split_line("  cert   verify CERT001 ").unwrap(), vec!["cert", "verify", "CERT001"]);
        assert_eq!(split_line(r#"cert reject CERT002 """#).unwrap(), vec!["cert", "reject", "CERT002", ""]);
        assert!(split_line(r#"search "delhi"#).is_err());
    }

    #[test]
    fn test_shell_line_parses_commands() {
        let line = ShellLine::try_parse_from(["login", "admin@iitd.ac.in", "--as", "admin"]).unwrap();
        assert!(matches!(
            line.command,
            Commands::Login { user_type: UserType::Admin, .. }
        ));

        let line = ShellLine::try_parse_from(["cert", "upload"]).unwrap();
        match line.command {
            Commands::Cert {
                command: CertCommands::Upload { certificate_type },
            } => assert_eq!(certificate_type, DEFAULT_CERTIFICATE_TYPE),
            _ => panic!("expected cert upload"),
        }

        assert!(ShellLine::try_parse_from(["login", "x", "--as", "teacher"]).is_err());
    }

    #[test]
    fn test_login_failure_shows_hint() {
        let mut app = app();
        let err = run(
            &mut app,
            Commands::Login {
                email: "ghost@example.com".to_string(),
                password: String::new(),
                user_type: UserType::Student,
            },
        )
        .unwrap_err();
        assert_eq!(user_message(&err).as_deref(), Some(LOGIN_HINT));
    }

    #[test]
    fn test_role_gates() {
        let mut app = app();
        let err = run(
            &mut app,
            Commands::Cert {
                command: CertCommands::Approve { id: "CERT002".to_string() },
            },
        )
        .unwrap_err();
        assert_eq!(
            user_message(&err).as_deref(),
            Some("Please log in as admin first.")
        );
        assert_eq!(app.store.list_pending_certificates().len(), 1);
    }

    #[test]
    fn test_upload_then_approve_flow() {
        let mut app = app();

        run(
            &mut app,
            Commands::Login {
                email: "rahul@example.com".to_string(),
                password: "password".to_string(),
                user_type: UserType::Student,
            },
        )
        .unwrap();
        run(
            &mut app,
            Commands::Cert {
                command: CertCommands::Upload {
                    certificate_type: "Hackathon Winner".to_string(),
                },
            },
        )
        .unwrap();
        assert_eq!(app.store.verify_certificate("CERT004"), Verification::Pending);

        run(&mut app, Commands::Logout).unwrap();
        run(
            &mut app,
            Commands::Login {
                email: "admin@college.edu".to_string(),
                password: String::new(),
                user_type: UserType::Admin,
            },
        )
        .unwrap();
        run(
            &mut app,
            Commands::Cert {
                command: CertCommands::Approve { id: "CERT004".to_string() },
            },
        )
        .unwrap();

        match app.store.verify_certificate("CERT004") {
            Verification::Approved {
                student_name,
                university_name,
                ..
            } => {
                assert_eq!(student_name.as_deref(), Some("Rahul Kumar"));
                assert_eq!(
                    university_name.as_deref(),
                    Some("Indian Institute of Science Bangalore")
                );
            }
            other => panic!("expected approved, got {other:?}"),
        }
    }

    #[test]
    fn test_blank_inputs_are_validation_errors() {
        let mut app = app();

        let err = run(&mut app, Commands::Search { query: "  ".to_string() }).unwrap_err();
        assert_eq!(user_message(&err).as_deref(), Some("Please enter a search query."));

        let err = run(
            &mut app,
            Commands::Cert {
                command: CertCommands::Verify { id: String::new() },
            },
        )
        .unwrap_err();
        assert_eq!(user_message(&err).as_deref(), Some("Please enter a certificate ID."));
    }

    #[test]
    fn test_date_falls_back_to_iso_for_time_formats() {
        let mut app = app();
        let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        assert_eq!(app.date(date), "Jan 15, 2024");

        app.config.display.date_format = "%H:%M".to_string();
        assert_eq!(app.date(date), "2024-01-15");
    }

    #[test]
    fn test_logout_when_logged_out_is_harmless() {
        let mut app = app();
        assert!(!app.session.is_authenticated());
        run(&mut app, Commands::Logout).unwrap();
        assert!(!app.session.is_authenticated());
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("Indian Institute of Technology", 10), "Indian ...");
    }
}
