use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use teaxis_core::screens::appointments::{AppointmentDetailScreen, AppointmentsScreen};
use teaxis_core::screens::professionals::{ProfessionalDetailScreen, ProfessionalsScreen};
use teaxis_core::screens::profile::{ProfessionalProfileScreen, ProfileMode, UserProfileScreen};
use teaxis_core::screens::{
    HomeScreen, LoginScreen, MatchingScreen, RegisterScreen, SettingsScreen,
};
use teaxis_core::validation::RegistrationForm;
use teaxis_core::*;

type CmdResult = std::result::Result<(), Notice>;

#[derive(Parser)]
#[command(name = "teaxis")]
#[command(about = "Teaxis care-matching platform client", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory (where the session is stored)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Override the backend address
    #[arg(long, global = true)]
    api_url: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in
    Login {
        #[arg(long)]
        email: String,

        #[arg(long, env = "TEAXIS_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Sign out
    Logout,

    /// Create a patient account
    Register(RegisterArgs),

    /// Show who is signed in
    Whoami,

    /// View or edit your profile
    #[command(subcommand)]
    Profile(ProfileCommand),

    /// View or edit your professional profile
    #[command(subcommand)]
    ProfessionalProfile(ProfessionalProfileCommand),

    /// List professionals
    Professionals,

    /// Show one professional
    Professional { id: i64 },

    /// Schedule an appointment with a professional
    Schedule(ScheduleArgs),

    /// Your appointments
    #[command(subcommand)]
    Sessions(SessionsCommand),

    /// One appointment
    #[command(subcommand)]
    Session(SessionCommand),

    /// Ask for professionals matching your profile
    Matching,

    /// Add or remove a professional from your favorites
    Favorite { professional_id: i64 },

    /// Permanently delete your account
    DeleteAccount {
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Args)]
struct RegisterArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    email: String,
    #[arg(long, env = "TEAXIS_PASSWORD", hide_env_values = true)]
    password: String,
    #[arg(long)]
    confirm_password: String,
    /// YYYY-MM-DD
    #[arg(long)]
    birth_date: String,
    #[arg(long, default_value = "")]
    neurodivergence: String,
    /// Comma-separated
    #[arg(long, default_value = "")]
    hobbies: String,
    #[arg(long, default_value = "")]
    communication_mode: String,
    #[arg(long, default_value = "")]
    sensory_preferences: String,
}

#[derive(Subcommand)]
enum ProfileCommand {
    /// Show the stored profile
    Show,
    /// Fetch the profile from the server
    Refresh,
    /// Change profile fields; omitted fields keep their value
    Update(ProfileArgs),
}

#[derive(Args)]
struct ProfileArgs {
    #[arg(long)]
    name: Option<String>,
    /// YYYY-MM-DD
    #[arg(long)]
    birth_date: Option<String>,
    /// male, female or other
    #[arg(long, value_parser = parse_gender)]
    gender: Option<Gender>,
    #[arg(long)]
    city: Option<String>,
    #[arg(long)]
    state: Option<String>,
    #[arg(long)]
    neurodivergence: Option<String>,
    #[arg(long)]
    sensory_preferences: Option<String>,
    #[arg(long)]
    communication_mode: Option<String>,
    #[arg(long)]
    school_history: Option<String>,
    /// Comma-separated
    #[arg(long)]
    hobbies: Option<String>,
}

#[derive(Subcommand)]
enum ProfessionalProfileCommand {
    Show,
    /// Create or update; omitted fields keep their value
    Save {
        #[arg(long)]
        availability: Option<String>,
        #[arg(long)]
        certifications: Option<String>,
        #[arg(long)]
        specializations: Option<String>,
        #[arg(long)]
        methods: Option<String>,
        #[arg(long)]
        hobbies: Option<String>,
    },
    /// Turn your account into a professional account
    Become,
}

#[derive(Args)]
struct ScheduleArgs {
    professional_id: i64,
    /// YYYY-MM-DDTHH:MM:SS
    #[arg(long)]
    at: String,
    /// Place or meeting link
    #[arg(long)]
    location: String,
    /// online or in-person
    #[arg(long, value_parser = parse_kind, default_value = "online")]
    kind: AppointmentKind,
    #[arg(long, default_value = "")]
    notes: String,
    /// Minutes
    #[arg(long, default_value = "50")]
    duration: String,
}

#[derive(Subcommand)]
enum SessionsCommand {
    /// List your appointments and the quick actions available on each
    List,
    /// Apply a quick action
    Act {
        id: i64,
        #[arg(value_parser = parse_status)]
        status: AppointmentStatus,
        #[arg(long)]
        note: Option<String>,
    },
}

#[derive(Subcommand)]
enum SessionCommand {
    Show { id: i64 },
    /// Change the status (professionals)
    Status {
        id: i64,
        #[arg(value_parser = parse_status)]
        status: AppointmentStatus,
        #[arg(long, default_value = "")]
        notes: String,
    },
    /// Cancel a scheduled appointment (patients)
    Cancel { id: i64 },
    /// Rate the professional of a completed appointment (patients)
    Rate {
        id: i64,
        /// 1.0 to 5.0 in steps of 0.5
        #[arg(long, default_value_t = 5.0)]
        score: f64,
        #[arg(long, default_value = "")]
        comment: String,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    teaxis_core::logging::init();

    let cli = Cli::parse();

    let mut config = Config::load()?;
    if let Some(data_dir) = cli.data_dir {
        config.data.data_dir = data_dir;
    }
    if let Some(api_url) = cli.api_url {
        config.api.base_url = api_url;
    }
    config.validate()?;

    teaxis_core::logging::set_level(&config.logging.level);
    tracing::debug!(
        "Backend {} with data dir {:?}",
        config.api.base_url,
        config.data.data_dir
    );

    let ctx = AppContext::from_config(&config)?;
    if let Err(notice) = run(cli.command, ctx).await {
        eprintln!("✗ {}", notice);
        std::process::exit(1);
    }
    Ok(())
}

async fn run(command: Commands, ctx: AppContext) -> CmdResult {
    gate(&ctx, route_of(&command))?;

    match command {
        Commands::Login { email, password } => cmd_login(ctx, email, password).await,
        Commands::Logout => {
            let notice = SettingsScreen::new(ctx).logout();
            print_notice(&notice);
            Ok(())
        }
        Commands::Register(args) => cmd_register(ctx, args).await,
        Commands::Whoami => cmd_whoami(ctx),
        Commands::Profile(cmd) => cmd_profile(ctx, cmd).await,
        Commands::ProfessionalProfile(cmd) => cmd_professional_profile(ctx, cmd).await,
        Commands::Professionals => cmd_professionals(ctx).await,
        Commands::Professional { id } => cmd_professional(ctx, id).await,
        Commands::Schedule(args) => cmd_schedule(ctx, args).await,
        Commands::Sessions(cmd) => cmd_sessions(ctx, cmd).await,
        Commands::Session(cmd) => cmd_session(ctx, cmd).await,
        Commands::Matching => cmd_matching(ctx).await,
        Commands::Favorite { professional_id } => cmd_favorite(ctx, professional_id).await,
        Commands::DeleteAccount { yes } => {
            let notice = SettingsScreen::new(ctx).delete_account(yes).await?;
            print_notice(&notice);
            Ok(())
        }
    }
}

fn route_of(command: &Commands) -> Option<Route> {
    let route = match command {
        Commands::Login { .. } => Route::Login,
        Commands::Register(_) => Route::Register,
        Commands::Logout | Commands::Whoami => return None,
        Commands::Profile(_) => Route::UserProfile,
        Commands::ProfessionalProfile(_) => Route::ProfessionalProfile,
        Commands::Professionals | Commands::Favorite { .. } => Route::Professionals,
        Commands::Professional { .. } | Commands::Schedule(_) => Route::ProfessionalDetail,
        Commands::Sessions(_) => Route::Appointments,
        Commands::Session(_) => Route::AppointmentDetail,
        Commands::Matching => Route::Matching,
        Commands::DeleteAccount { .. } => Route::Settings,
    };
    Some(route)
}

/// Refuse commands whose screen does not exist in the current session phase
fn gate(ctx: &AppContext, route: Option<Route>) -> CmdResult {
    let Some(route) = route else {
        return Ok(());
    };
    let screens = ctx.screen_set();
    if screens.allows(route) {
        return Ok(());
    }
    match screens {
        ScreenSet::Anonymous => Err(Notice::error(
            "Not signed in",
            "Please sign in first: teaxis login --email <e-mail>",
        )),
        ScreenSet::Authenticated => Err(Notice::error(
            "Already signed in",
            "Run `teaxis logout` first.",
        )),
    }
}

// ============================================================================
// Commands
// ============================================================================

async fn cmd_login(ctx: AppContext, email: String, password: String) -> CmdResult {
    let mut screen = LoginScreen::new(ctx);
    screen.email = email;
    screen.password = password;
    let notice = screen.submit().await?;
    print_notice(&notice);
    Ok(())
}

async fn cmd_register(ctx: AppContext, args: RegisterArgs) -> CmdResult {
    let mut screen = RegisterScreen::new(ctx);
    screen.form = RegistrationForm {
        name: args.name,
        email: args.email,
        password: args.password,
        confirm_password: args.confirm_password,
        birth_date: args.birth_date,
        neurodivergence: args.neurodivergence,
        hobbies: args.hobbies,
        communication_mode: args.communication_mode,
        sensory_preferences: args.sensory_preferences,
    };
    let notice = screen.submit().await?;
    print_notice(&notice);
    Ok(())
}

fn cmd_whoami(ctx: AppContext) -> CmdResult {
    match HomeScreen::new(ctx).greeting() {
        Some(greeting) => println!("{}", greeting),
        None => println!("Not signed in."),
    }
    Ok(())
}

async fn cmd_profile(ctx: AppContext, cmd: ProfileCommand) -> CmdResult {
    let mut screen = UserProfileScreen::new(ctx);
    match cmd {
        ProfileCommand::Show => screen.load().await?,
        ProfileCommand::Refresh => screen.refresh().await?,
        ProfileCommand::Update(args) => {
            screen.load().await?;
            let form = &mut screen.form;
            set(&mut form.name, args.name);
            set(&mut form.birth_date, args.birth_date);
            if args.gender.is_some() {
                form.gender = args.gender;
            }
            set(&mut form.city, args.city);
            set(&mut form.state, args.state);
            set(&mut form.neurodivergence, args.neurodivergence);
            set(&mut form.sensory_preferences, args.sensory_preferences);
            set(&mut form.communication_mode, args.communication_mode);
            set(&mut form.school_history, args.school_history);
            set(&mut form.hobbies, args.hobbies);
            let notice = screen.save().await?;
            print_notice(&notice);
        }
    }
    if let Some(user) = screen.view.ready() {
        print_user(user);
    }
    Ok(())
}

async fn cmd_professional_profile(ctx: AppContext, cmd: ProfessionalProfileCommand) -> CmdResult {
    let mut screen = ProfessionalProfileScreen::new(ctx);
    match cmd {
        ProfessionalProfileCommand::Show => {
            screen.load().await?;
        }
        ProfessionalProfileCommand::Save {
            availability,
            certifications,
            specializations,
            methods,
            hobbies,
        } => {
            screen.load().await?;
            let form = &mut screen.form;
            set(&mut form.availability, availability);
            set(&mut form.certifications, certifications);
            set(&mut form.specializations, specializations);
            set(&mut form.methods, methods);
            set(&mut form.hobbies, hobbies);
            let notice = screen.save().await?;
            print_notice(&notice);
        }
        ProfessionalProfileCommand::Become => {
            let notice = screen.become_professional().await?;
            print_notice(&notice);
            return Ok(());
        }
    }

    if screen.mode == ProfileMode::Create {
        if let Some(hint) = &screen.hint {
            print_notice(hint);
        }
    }
    if let Some(profile) = screen.view.ready() {
        print_professional(profile);
    }
    Ok(())
}

async fn cmd_professionals(ctx: AppContext) -> CmdResult {
    let mut screen = ProfessionalsScreen::new(ctx);
    screen.load().await?;
    let list = screen.list.ready().map(Vec::as_slice).unwrap_or_default();
    if list.is_empty() {
        println!("No professionals found.");
    }
    for p in list {
        let star = if screen.is_favorite(p.id) { "★" } else { " " };
        println!(
            "{} [{}] {}{}",
            star,
            p.id,
            p.display_name(),
            p.average_rating
                .map(|r| format!("  ({:.1})", r))
                .unwrap_or_default()
        );
    }
    Ok(())
}

async fn cmd_professional(ctx: AppContext, id: i64) -> CmdResult {
    let mut screen = ProfessionalDetailScreen::new(ctx, id);
    screen.load().await?;
    if let Some(profile) = screen.view.ready() {
        print_professional(profile);
    }
    Ok(())
}

async fn cmd_schedule(ctx: AppContext, args: ScheduleArgs) -> CmdResult {
    let mut screen = ProfessionalDetailScreen::new(ctx, args.professional_id);
    screen.form.date_time = args.at;
    screen.form.location = args.location;
    screen.form.kind = args.kind;
    screen.form.notes = args.notes;
    screen.form.duration = args.duration;
    let notice = screen.schedule().await?;
    print_notice(&notice);
    Ok(())
}

async fn cmd_sessions(ctx: AppContext, cmd: SessionsCommand) -> CmdResult {
    let mut screen = AppointmentsScreen::new(ctx.clone());
    screen.load().await?;

    if let SessionsCommand::Act { id, status, note } = cmd {
        let notice = screen.quick_update(id, status, note).await?;
        print_notice(&notice);
    }

    let role = ctx.session.role();
    let list = screen.list.ready().map(Vec::as_slice).unwrap_or_default();
    if list.is_empty() {
        println!("No appointments yet.");
    }
    for appointment in list {
        let with = role
            .map(|r| appointment.counterpart_name(r))
            .unwrap_or_default();
        println!(
            "[{}] {}  {}  {}",
            appointment.id,
            appointment.scheduled_for.format("%Y-%m-%d %H:%M"),
            appointment.status,
            with
        );
        let actions = screen.actions_for(appointment);
        if !actions.is_empty() {
            let names: Vec<&str> = actions.iter().map(|s| s.as_wire()).collect();
            println!("      actions: {}", names.join(", "));
        }
    }
    Ok(())
}

async fn cmd_session(ctx: AppContext, cmd: SessionCommand) -> CmdResult {
    let id = match &cmd {
        SessionCommand::Show { id }
        | SessionCommand::Status { id, .. }
        | SessionCommand::Cancel { id }
        | SessionCommand::Rate { id, .. } => *id,
    };
    let mut screen = AppointmentDetailScreen::new(ctx, id);
    screen.load().await?;

    let notice = match cmd {
        SessionCommand::Show { .. } => None,
        SessionCommand::Status { status, notes, .. } => {
            screen.status_form.status = status;
            screen.status_form.notes = notes;
            Some(screen.update_status().await?)
        }
        SessionCommand::Cancel { .. } => Some(screen.cancel().await?),
        SessionCommand::Rate { score, comment, .. } => {
            screen.rating_form.score = score;
            screen.rating_form.comment = comment;
            Some(screen.submit_rating().await?)
        }
    };
    if let Some(notice) = notice {
        print_notice(&notice);
    }

    if let Some(appointment) = screen.view.ready() {
        print_appointment(appointment);
    }
    if let Some(rating) = &screen.existing_rating {
        println!("  Your rating: {:.1}", rating.score);
    }
    Ok(())
}

async fn cmd_matching(ctx: AppContext) -> CmdResult {
    let mut screen = MatchingScreen::new(ctx);
    if let Some(notice) = screen.suggest().await? {
        print_notice(&notice);
    }
    for matching in screen.suggestions.ready().map(Vec::as_slice).unwrap_or_default() {
        println!(
            "[{}] {}{}",
            matching.professional.id,
            matching.professional.display_name(),
            matching
                .score
                .map(|s| format!("  (score {:.1})", s))
                .unwrap_or_default()
        );
    }
    Ok(())
}

async fn cmd_favorite(ctx: AppContext, professional_id: i64) -> CmdResult {
    let mut screen = ProfessionalsScreen::new(ctx);
    screen.load().await?;
    let notice = screen.toggle_favorite(professional_id).await?;
    print_notice(&notice);
    Ok(())
}

// ============================================================================
// Output
// ============================================================================

fn print_notice(notice: &Notice) {
    let mark = match notice.level {
        NoticeLevel::Success => "✓",
        NoticeLevel::Info => "ℹ",
        NoticeLevel::Error => "✗",
    };
    println!("{} {}", mark, notice);
}

fn print_user(user: &User) {
    println!();
    println!("  {} <{}>", user.name, user.email);
    println!("  Role: {}", user.role);
    if let Some(date) = user.birth_date {
        println!("  Birth date: {}", date);
    }
    let place: Vec<&str> = [user.city.as_deref(), user.state.as_deref()]
        .into_iter()
        .flatten()
        .collect();
    if !place.is_empty() {
        println!("  Lives in: {}", place.join(", "));
    }
    if let Some(value) = &user.neurodivergence {
        println!("  Neurodivergence: {}", value);
    }
    if let Some(value) = &user.communication_mode {
        println!("  Communication: {}", value);
    }
    if let Some(hobbies) = user.hobbies.as_ref().filter(|h| !h.is_empty()) {
        println!("  Hobbies: {}", hobbies.join(", "));
    }
    println!();
}

fn print_professional(profile: &Professional) {
    println!();
    println!("  {}", profile.display_name());
    if let Some(rating) = profile.average_rating {
        println!("  Average rating: {:.1}", rating);
    }
    if let Some(availability) = &profile.availability {
        println!("  Availability: {}", availability);
    }
    for (label, values) in [
        ("Specializations", &profile.specializations),
        ("Certifications", &profile.certifications),
        ("Methods", &profile.methods),
        ("Hobbies", &profile.hobbies),
    ] {
        if let Some(values) = values.as_ref().filter(|v| !v.is_empty()) {
            println!("  {}: {}", label, values.join(", "));
        }
    }
    println!();
}

fn print_appointment(appointment: &Appointment) {
    println!();
    println!("  Appointment {}", appointment.id);
    println!("  Patient: {}", appointment.user.name);
    println!("  Professional: {}", appointment.professional.display_name());
    println!("  When: {}", appointment.scheduled_for.format("%Y-%m-%d %H:%M"));
    println!("  Status: {}", appointment.status);
    if let Some(location) = &appointment.location {
        println!("  Where: {}", location);
    }
    if let Some(minutes) = appointment.duration_minutes {
        println!("  Duration: {} min", minutes);
    }
    if let Some(notes) = &appointment.user_notes {
        println!("  Patient notes: {}", notes);
    }
    if let Some(notes) = &appointment.professional_notes {
        println!("  Professional notes: {}", notes);
    }
    println!();
}

// ============================================================================
// Argument helpers
// ============================================================================

fn set(field: &mut String, value: Option<String>) {
    if let Some(value) = value {
        *field = value;
    }
}

fn parse_gender(value: &str) -> std::result::Result<Gender, String> {
    match value.to_lowercase().as_str() {
        "male" | "masculino" => Ok(Gender::Male),
        "female" | "feminino" => Ok(Gender::Female),
        "other" | "outro" => Ok(Gender::Other),
        _ => Err(format!("unknown gender {:?} (male, female, other)", value)),
    }
}

fn parse_kind(value: &str) -> std::result::Result<AppointmentKind, String> {
    match value.to_lowercase().as_str() {
        "online" => Ok(AppointmentKind::Online),
        "in-person" | "presencial" => Ok(AppointmentKind::InPerson),
        _ => Err(format!("unknown kind {:?} (online, in-person)", value)),
    }
}

fn parse_status(value: &str) -> std::result::Result<AppointmentStatus, String> {
    AppointmentStatus::parse(value).ok_or_else(|| format!("unknown status {:?}", value))
}
