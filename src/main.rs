//! playground - headless session driver
//!
//! ```text
//! playground ls <template.json>
//! playground mount <template.json> [dir]
//! playground suggest <template.json> <path> <line> <column>
//! ```

use std::io;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::sync::Arc;
use std::time::{Duration, Instant};

use playground::kernel::services::adapters::{
    ensure_settings_file, get_project_dir, load_settings, AsyncRuntime, HttpSuggestionProvider,
    JsonFileStore, LocalDirRuntime, RuntimeSession,
};
use playground::kernel::services::ports::{EditorSurface, Position, Settings};
use playground::kernel::{BufferEditor, Playground, Transition};
use playground::models::FileTree;

mod logging;

const USAGE: &str = "usage:
  playground ls <template.json>
  playground mount <template.json> [dir]
  playground suggest <template.json> <path> <line> <column>";

fn main() -> io::Result<()> {
    let _logging = logging::init();
    if let Err(e) = ensure_settings_file() {
        tracing::warn!(error = %e, "cannot create settings file");
    }
    let settings = load_settings().unwrap_or_default();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    let (tx, rx) = mpsc::channel();
    let runtime = AsyncRuntime::new(tx)?;

    match args.as_slice() {
        ["ls", template] => {
            let store = JsonFileStore::new(*template);
            let tree = load_tree(&runtime, &store)?;
            let mut playground = Playground::new(
                tree,
                Arc::new(RuntimeSession::new(Arc::new(LocalDirRuntime::new(
                    std::env::temp_dir(),
                )))),
                Arc::new(store),
                &settings,
            );
            list_files(&mut playground)
        }
        ["mount", template, rest @ ..] if rest.len() <= 1 => {
            let dir = match rest.first() {
                Some(dir) => PathBuf::from(dir),
                None => default_mount_dir(&settings, template)?,
            };
            let store = JsonFileStore::new(*template);
            let tree = load_tree(&runtime, &store)?;
            let session = Arc::new(RuntimeSession::new(Arc::new(LocalDirRuntime::new(&dir))));
            let playground = Playground::new(tree, session, Arc::new(store), &settings);
            let written = runtime
                .block_on(playground.boot_and_mount())
                .map_err(io::Error::other)?;
            println!("mounted {written} file(s) into {}", dir.display());
            Ok(())
        }
        ["suggest", template, path, line, column] => {
            let position = Position::new(parse_number(line)?, parse_number(column)?);
            let store = JsonFileStore::new(*template);
            let tree = load_tree(&runtime, &store)?;
            let session = Arc::new(RuntimeSession::new(Arc::new(LocalDirRuntime::new(
                std::env::temp_dir(),
            ))));
            let mut playground = Playground::new(tree, session, Arc::new(store), &settings);

            let mut editor = BufferEditor::new(*path, "");
            let id = playground
                .open_path(path, &mut editor)
                .map_err(io::Error::other)?;
            let content = playground
                .explorer()
                .get(&id)
                .map(|file| file.content.clone())
                .unwrap_or_default();
            editor = BufferEditor::new(*path, &content);
            editor.set_cursor(position);

            let provider = HttpSuggestionProvider::from_settings(&settings.suggestions)
                .map_err(io::Error::other)?;
            let dispatcher = runtime.suggestion_dispatcher(Arc::new(provider));
            let Some(fetch) = playground
                .suggestions_mut()
                .trigger(Instant::now(), &mut editor)
            else {
                println!("suggestions are disabled");
                return Ok(());
            };
            dispatcher.dispatch(fetch);

            let wait = settings.suggestions.request_timeout() + Duration::from_secs(1);
            let message = rx
                .recv_timeout(wait)
                .map_err(|e| io::Error::new(io::ErrorKind::TimedOut, e))?;
            match playground.handle_message(message, &mut editor) {
                Transition::Shown => {
                    if let Some(overlay) = editor.decorations() {
                        for span in &overlay.spans {
                            println!("{}", span.text);
                        }
                    }
                }
                _ => println!("no suggestion"),
            }
            Ok(())
        }
        _ => {
            eprintln!("{USAGE}");
            Err(io::Error::new(io::ErrorKind::InvalidInput, "bad arguments"))
        }
    }
}

fn load_tree(runtime: &AsyncRuntime, store: &JsonFileStore) -> io::Result<FileTree> {
    let template = runtime
        .block_on(store.load())
        .map_err(|e| io::Error::other(format!("{}: {e}", store.path().display())))?;
    Ok(FileTree::from_template(&template))
}

fn list_files(playground: &mut Playground) -> io::Result<()> {
    let tree = playground.explorer().tree().clone();
    for node in tree.files() {
        let Some(path) = tree.path_of(node) else {
            continue;
        };
        let mut editor = BufferEditor::new(path.clone(), "");
        let id = playground
            .open_file(node, &mut editor)
            .map_err(io::Error::other)?;
        println!("{id}\t{path}");
    }
    Ok(())
}

fn default_mount_dir(settings: &Settings, template: &str) -> io::Result<PathBuf> {
    if let Some(dir) = &settings.runtime.mirror_dir {
        return Ok(dir.clone());
    }
    let stem = Path::new(template)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("project");
    get_project_dir(stem).ok_or_else(|| {
        io::Error::new(io::ErrorKind::NotFound, "Cannot determine project directory")
    })
}

fn parse_number(value: &str) -> io::Result<u32> {
    value
        .parse()
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, format!("{value}: {e}")))
}
