use crate::cli::*;
use anyhow::{bail, Context};
use docrepo_core::db::open_db;
use docrepo_core::{
    DocumentRepository, Filter, JsonDocument, QueryOptions, SaveOptions, SqliteDocumentStore,
    UpdateOptions,
};
use log::info;
use serde::Serialize;
use serde_json::{json, Value};

type Repo<'s, 'c> = DocumentRepository<'s, JsonDocument, SqliteDocumentStore<'c>>;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let conn = open_db(&cli.db)
        .with_context(|| format!("cannot open database `{}`", cli.db.display()))?;
    let store = SqliteDocumentStore::try_new(&conn, cli.collection.as_str())?;
    let repo = DocumentRepository::<JsonDocument, _>::new(&store).with_default_logging();

    info!(
        "event=cli_command module=cli status=start collection={} db={}",
        cli.collection,
        cli.db.display()
    );

    match cli.command {
        Command::Create(args) => cmd_create(&repo, args),
        Command::Get(args) => cmd_get(&repo, args),
        Command::Find(args) => cmd_find(&repo, args),
        Command::Update(args) => cmd_update(&repo, args),
        Command::Remove(args) => cmd_remove(&repo, args),
        Command::Count(args) => cmd_count(&repo, args),
        Command::Validate(args) => print_json(&repo.validate_object_ids(args.ids.as_slice())),
        Command::UniqueIndex(args) => cmd_unique_index(&store, args),
    }
}

fn cmd_create(repo: &Repo<'_, '_>, args: CreateArgs) -> anyhow::Result<()> {
    let input = parse_json(&args.json, "document")?;
    let options = SaveOptions {
        timestamps: !args.keep_timestamps,
    };
    let document = repo.create(&input, &options)?;
    print_json(&document)
}

fn cmd_get(repo: &Repo<'_, '_>, args: GetArgs) -> anyhow::Result<()> {
    let options = QueryOptions {
        projection: args.fields,
        ..QueryOptions::default()
    };
    match repo.get_one_by_id(&args.id, &options) {
        Some(document) => print_json(&document),
        None => bail!("document not found: {}", args.id),
    }
}

fn cmd_find(repo: &Repo<'_, '_>, args: FindArgs) -> anyhow::Result<()> {
    let filter = parse_filter(args.filter.as_deref())?;
    let options = QueryOptions {
        sort: args.sort,
        projection: args.fields,
        skip: args.skip,
        limit: args.limit,
    };
    print_json(&repo.get_all(&filter, &options))
}

fn cmd_update(repo: &Repo<'_, '_>, args: UpdateArgs) -> anyhow::Result<()> {
    let patch = parse_json(&args.json, "patch")?;
    let options = UpdateOptions {
        projection: args.fields,
    };
    let document = repo.update_one_by_id(&args.id, &patch, &options)?;
    print_json(&document)
}

fn cmd_remove(repo: &Repo<'_, '_>, args: RemoveArgs) -> anyhow::Result<()> {
    let acknowledged = repo.remove_one_by_id(&args.id)?;
    print_json(&json!({ "acknowledged": acknowledged }))
}

fn cmd_count(repo: &Repo<'_, '_>, args: CountArgs) -> anyhow::Result<()> {
    let filter = parse_filter(args.filter.as_deref())?;
    print_json(&repo.count(&filter)?)
}

fn cmd_unique_index(store: &SqliteDocumentStore<'_>, args: UniqueIndexArgs) -> anyhow::Result<()> {
    let fields: Vec<&str> = args.fields.iter().map(String::as_str).collect();
    let name = store.ensure_unique_index(&fields)?;
    print_json(&json!({ "index": name, "fields": args.fields }))
}

fn parse_json(text: &str, what: &str) -> anyhow::Result<Value> {
    serde_json::from_str(text).with_context(|| format!("{what} is not valid JSON"))
}

fn parse_filter(text: Option<&str>) -> anyhow::Result<Filter> {
    match text {
        Some(text) => Ok(Filter::from_json(&parse_json(text, "filter")?)?),
        None => Ok(Filter::all()),
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
