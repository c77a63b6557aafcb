use tame_connect::{viewer::ViewerDocument, *};

// This example lists the Trimble Connect projects visible to a token, and
// optionally the files in one of them. Acquiring the token is up to you, eg.
// via your platform's OAuth2 integration, then pass it in the
// `TRIMBLE_CONNECT_ACCESS_TOKEN` environment variable.
//
// list_projects                       -> table of projects
// list_projects <project_id>          -> every file in the project
// list_projects <project_id> <model>  -> writes a viewer document for the model
fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let token: AccessToken = std::env::var("TRIMBLE_CONNECT_ACCESS_TOKEN")
        .expect("TRIMBLE_CONNECT_ACCESS_TOKEN must be set")
        .parse()
        .expect("the access token is empty");

    let config = Config::from_env().expect("invalid configuration");
    let transport = ReqwestTransport::new().expect("failed to create HTTP client");
    let client = ConnectClient::new(config, transport);

    let mut args = std::env::args().skip(1);

    let project_id = match args.next() {
        Some(id) => id,
        None => {
            match client.fetch_projects(&token) {
                Ok(rows) => print!("{}", render_table(&rows)),
                Err(e) => {
                    eprintln!("failed to fetch projects ({:?}): {}", e.kind(), e);
                    std::process::exit(1);
                }
            }
            return;
        }
    };

    if let Some(model_id) = args.next() {
        let html = ViewerDocument::new(&token, &project_id, &model_id)
            .render()
            .expect("failed to render viewer");
        std::fs::write(viewer::VIEWER_FILE_NAME, html).expect("failed to write viewer");
        println!("wrote {}", viewer::VIEWER_FILE_NAME);
        return;
    }

    match client.list_project_files(&token, &project_id) {
        Ok(files) => {
            for file in files {
                println!("{}\t{}", file.id.unwrap_or_default(), file.path);
            }
        }
        Err(e) => {
            eprintln!("failed to list files ({:?}): {}", e.kind(), e);
            std::process::exit(1);
        }
    }
}
