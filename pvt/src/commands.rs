//! CLI command implementations.

use pvx::{
    export, import, is_help, parse_command, Command, Config, LocalStore, ParseContext, PointRef,
    StoreSession, Tool, TransferSummary,
};
use uuid::Uuid;

/// Program name shown in usage text.
const PROGRAM: &str = "pvt";

/// `pvt dump ...`
pub fn dump(words: &[String]) -> pvx::Result<()> {
    let Some((command, config)) = prepare(Tool::Export, words)? else {
        return Ok(());
    };

    let target = command.store.as_deref().unwrap_or(&config.default_store).to_string();
    let store = LocalStore::new(config);
    let summary = export(&store, &target, &command)?;

    report("Dumped", &summary);
    Ok(())
}

/// `pvt load ...`
pub fn load(words: &[String]) -> pvx::Result<()> {
    let Some((command, config)) = prepare(Tool::Import, words)? else {
        return Ok(());
    };

    let target = command.store.as_deref().unwrap_or(&config.default_store).to_string();
    let store = LocalStore::new(config);
    let summary = import(&store, &target, &command)?;

    report("Loaded", &summary);
    Ok(())
}

/// Parse the keyword arguments and load the configuration they name.
///
/// None when the arguments only asked for help.
fn prepare(tool: Tool, words: &[String]) -> pvx::Result<Option<(Command, Config)>> {
    if is_help(words) {
        println!("{}", tool.usage(PROGRAM));
        return Ok(None);
    }

    let ctx = ParseContext::local();
    let mut command = parse_command(tool, words.iter().cloned(), &ctx)?;
    let config = Config::resolve(command.with.as_deref())?;
    if config.utc {
        // Same instant, literals read as UTC.
        command = parse_command(tool, words.iter().cloned(), &ParseContext::utc(ctx.now))?;
    }

    tracing::debug!(?command, "Parsed {}", tool.name());
    Ok(Some((command, config)))
}

fn report(verb: &str, summary: &TransferSummary) {
    if summary.count == 0 {
        tracing::info!("No values {}", verb.to_lowercase());
        return;
    }
    tracing::info!("{} values: {}", verb, summary.count);
    if let Some(first) = summary.first_version {
        tracing::info!("First version: {}", first.to_rfc3339());
    }
    if let Some(last) = summary.last_version {
        tracing::info!("Last version: {}", last.to_rfc3339());
    }
}

/// `pvt init`
pub fn init(
    store: Option<&str>,
    with: Option<&str>,
    user: Option<&str>,
    password: Option<&str>,
) -> pvx::Result<()> {
    let config = Config::resolve(with)?;
    let name = store.unwrap_or(&config.default_store).to_string();
    let store = LocalStore::new(config);

    let path = store.create(&name)?;
    println!("Store '{}' initialized at {}", name, path.display());

    if let Some(user) = user {
        let session = store.open_admin(&name)?;
        session.set_user(user, password)?;
        session.logout()?;
        println!("User '{}' added", user);
    }

    Ok(())
}

/// `pvt point`
pub fn point(
    name: &str,
    with: Option<&str>,
    store: Option<&str>,
    uuid: Option<Uuid>,
    synced: bool,
) -> pvx::Result<()> {
    let config = Config::resolve(with)?;
    let target = store.unwrap_or(&config.default_store).to_string();
    let store = LocalStore::new(config);

    let point = PointRef::named(uuid.unwrap_or_else(Uuid::new_v4), name);
    let mut session = store.open_admin(&target)?;
    session.register_point(&point, synced)?;
    session.logout()?;

    println!("{}", point.uuid);
    Ok(())
}
