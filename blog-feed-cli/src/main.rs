use std::fs;
use std::io;
use std::path::Path;
use std::process;

use anyhow::{Context, Result, anyhow};
use blog_feed::paging::{
    CommentFeed, FeedController, FeedDriver, HomeFeed, LoadOutcome, PageSource, PagedTable,
    SearchFeed, SentinelObserver, TagFeed, TagList,
};
use blog_feed::{
    ApiError, BlogClient, Comment, Post, PostCreate, PostUpdate, Tag, TagCreate, TagUpdate,
    flatten_comments,
};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::{debug, warn};

mod logging;
mod settings;

use logging::init_logging;
use settings::Settings;

const TOKEN_FILE: &str = ".blog_token";

#[derive(Serialize)]
struct HomeView<'a> {
    featured: Option<&'a Post>,
    posts: &'a [Post],
}

#[derive(Serialize)]
struct TagView<'a> {
    tag: &'a Tag,
    posts: &'a [Post],
}

#[derive(Serialize)]
struct PostView<'a> {
    post: &'a Post,
    comments: &'a [Comment],
}

#[derive(Debug, Parser)]
#[command(name = "blog-feed", version, about = "Чтение ленты блога и администрирование через REST API")]
struct Cli {
    /// Адрес API (по умолчанию BLOG_API_URL или http://127.0.0.1:8000).
    #[arg(long, global = true)]
    server: Option<String>,

    /// Выводить данные в JSON.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

/// Сколько раз «прокрутить» ленту после первой страницы.
#[derive(Debug, Clone, Copy, Args)]
struct ScrollArgs {
    /// Догрузить ленту до конца.
    #[arg(long, conflicts_with = "pages")]
    all: bool,

    /// Количество дополнительных страниц.
    #[arg(long, default_value_t = 0)]
    pages: u32,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Главная: закреплённый пост и лента всех постов.
    Home {
        #[command(flatten)]
        scroll: ScrollArgs,
    },
    /// Лента постов тега.
    Tag {
        slug: String,
        #[command(flatten)]
        scroll: ScrollArgs,
    },
    /// Пост и лента его комментариев.
    Post {
        slug: String,
        #[command(flatten)]
        scroll: ScrollArgs,
    },
    /// Поиск постов.
    Search {
        query: String,
        #[command(flatten)]
        scroll: ScrollArgs,
    },
    /// Лайк комментария.
    Like {
        #[arg(long)]
        id: i64,
    },
    /// Дизлайк комментария.
    Dislike {
        #[arg(long)]
        id: i64,
    },
    /// Вход администратора.
    Login {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
    },
    /// Выход: удаляет сохранённый токен.
    Logout,
    /// Администрирование (требует токен).
    #[command(subcommand)]
    Admin(AdminCommand),
}

#[derive(Debug, Subcommand)]
enum AdminCommand {
    /// Таблица постов.
    Posts {
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// Таблица тегов.
    Tags {
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// Все комментарии поста деревом.
    Comments {
        #[arg(long)]
        post_id: i64,
    },
    /// Создание поста.
    CreatePost {
        #[arg(long)]
        title: String,
        #[arg(long)]
        summary: String,
        #[arg(long)]
        content: String,
        #[arg(long)]
        slug: Option<String>,
        #[arg(long = "tag-id")]
        tag_ids: Vec<i64>,
        #[arg(long)]
        featured: bool,
    },
    /// Частичное обновление поста: меняются только переданные поля.
    UpdatePost {
        #[arg(long)]
        id: i64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        summary: Option<String>,
        #[arg(long)]
        content: Option<String>,
        #[arg(long)]
        slug: Option<String>,
        #[arg(long = "tag-id")]
        tag_ids: Vec<i64>,
        #[arg(long)]
        featured: Option<bool>,
    },
    /// Удаление поста.
    DeletePost {
        #[arg(long)]
        id: i64,
    },
    /// Создание тега.
    CreateTag {
        #[arg(long)]
        name: String,
        #[arg(long)]
        slug: Option<String>,
    },
    /// Частичное обновление тега.
    UpdateTag {
        #[arg(long)]
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        slug: Option<String>,
    },
    /// Удаление тега.
    DeleteTag {
        #[arg(long)]
        id: i64,
    },
    /// Удаление комментария вместе с ответами.
    DeleteComment {
        #[arg(long)]
        id: i64,
    },
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("Ошибка: {err}");
        process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    dotenvy::dotenv().ok();
    let settings = Settings::from_env()?;
    init_logging(&settings.log_level)?;

    let server = resolve_server(cli.server, &settings.api_url);
    debug!(server = %server, "using blog api");

    let mut client = BlogClient::with_timeouts(server, &settings.timeouts())
        .map_err(map_client_error)?;
    if let Some(token) = load_token().context("не удалось прочитать .blog_token")? {
        client.set_token(token);
    }

    let json = cli.json;
    match cli.command {
        Command::Home { scroll } => {
            let featured = match client.featured_post().await {
                Ok(post) => Some(post),
                Err(err) if err.is_not_found() => None,
                Err(err) => return Err(map_client_error(err)),
            };
            if let Some(post) = featured.as_ref().filter(|_| !json) {
                print_post("Закреплённый пост", post);
            }
            let feed = HomeFeed::new(client.clone());
            let feed = run_feed(feed, (), settings.feed_page_size, scroll, json, print_posts).await?;
            if json {
                print_json(&HomeView {
                    featured: featured.as_ref(),
                    posts: feed.items(),
                })?;
            }
        }
        Command::Tag { slug, scroll } => {
            let tag = client.tag_by_slug(&slug).await.map_err(map_client_error)?;
            if !json {
                println!("Тег: {} ({})", tag.name, tag.slug);
            }
            let feed = TagFeed::new(client.clone());
            let feed =
                run_feed(feed, tag.slug.clone(), settings.feed_page_size, scroll, json, print_posts)
                    .await?;
            if json {
                print_json(&TagView {
                    tag: &tag,
                    posts: feed.items(),
                })?;
            }
        }
        Command::Post { slug, scroll } => {
            let post = client.post_by_slug(&slug).await.map_err(map_client_error)?;
            if !json {
                print_post("Пост", &post);
                println!("content: {}", post.content);
                println!();
                println!("Комментарии:");
            }
            let feed = CommentFeed::new(client.clone());
            let feed = run_feed(
                feed,
                post.id,
                settings.comments_page_size,
                scroll,
                json,
                print_comments,
            )
            .await?;
            if json {
                print_json(&PostView {
                    post: &post,
                    comments: feed.items(),
                })?;
            }
        }
        Command::Search { query, scroll } => {
            let feed = SearchFeed::new(client.clone());
            let feed = run_feed(feed, query, settings.feed_page_size, scroll, json, print_posts).await?;
            if json {
                print_json(feed.items())?;
            }
        }
        Command::Like { id } => {
            let comment = client.like_comment(id).await.map_err(map_client_error)?;
            println!("Комментарий {}: likes={}", comment.id, comment.like_count);
        }
        Command::Dislike { id } => {
            let comment = client.dislike_comment(id).await.map_err(map_client_error)?;
            println!("Комментарий {}: likes={}", comment.id, comment.like_count);
        }
        Command::Login { username, password } => {
            client
                .login(&username, &password)
                .await
                .map_err(map_client_error)?;
            persist_token(&client).context("не удалось сохранить токен")?;
            println!("Вход выполнен: {username}");
        }
        Command::Logout => {
            client.logout();
            remove_token().context("не удалось удалить .blog_token")?;
            println!("Выход выполнен");
        }
        Command::Admin(command) => run_admin(&client, command, &settings, json).await?,
    }

    Ok(())
}

async fn run_admin(
    client: &BlogClient,
    command: AdminCommand,
    settings: &Settings,
    json: bool,
) -> Result<()> {
    if !client.is_authenticated() {
        return Err(map_client_error(ApiError::Unauthorized));
    }

    match command {
        AdminCommand::Posts { page } => {
            let table = PagedTable::new(HomeFeed::new(client.clone()), (), settings.admin_page_size);
            show_table(table, page, json, print_posts).await?;
        }
        AdminCommand::Tags { page } => {
            let table = PagedTable::new(TagList::new(client.clone()), (), settings.admin_page_size);
            show_table(table, page, json, print_tags).await?;
        }
        AdminCommand::Comments { post_id } => {
            let comments = client
                .all_comments(post_id)
                .await
                .map_err(map_client_error)?;
            if json {
                print_json(&comments)?;
            } else {
                print_comments(&comments);
            }
        }
        AdminCommand::CreatePost {
            title,
            summary,
            content,
            slug,
            tag_ids,
            featured,
        } => {
            let input = PostCreate {
                title,
                summary,
                content,
                slug,
                tag_ids: non_empty(tag_ids),
                featured: featured.then_some(true),
            };
            let post = client.create_post(&input).await.map_err(map_client_error)?;
            print_post("Пост создан", &post);
        }
        AdminCommand::UpdatePost {
            id,
            title,
            summary,
            content,
            slug,
            tag_ids,
            featured,
        } => {
            let patch = PostUpdate {
                title,
                summary,
                content,
                slug,
                tag_ids: non_empty(tag_ids),
                featured,
                ..PostUpdate::default()
            };
            let post = client
                .update_post(id, &patch)
                .await
                .map_err(map_client_error)?;
            print_post("Пост обновлён", &post);
        }
        AdminCommand::DeletePost { id } => {
            client.delete_post(id).await.map_err(map_client_error)?;
            println!("Пост удалён: id={id}");
        }
        AdminCommand::CreateTag { name, slug } => {
            let tag = client
                .create_tag(&TagCreate { name, slug })
                .await
                .map_err(map_client_error)?;
            print_tag("Тег создан", &tag);
        }
        AdminCommand::UpdateTag { id, name, slug } => {
            let tag = client
                .update_tag(id, &TagUpdate { name, slug })
                .await
                .map_err(map_client_error)?;
            print_tag("Тег обновлён", &tag);
        }
        AdminCommand::DeleteTag { id } => {
            client.delete_tag(id).await.map_err(map_client_error)?;
            println!("Тег удалён: id={id}");
        }
        AdminCommand::DeleteComment { id } => {
            client.delete_comment(id).await.map_err(map_client_error)?;
            println!("Комментарий удалён: id={id}");
        }
    }

    Ok(())
}

/// Показывает первую страницу ленты и «прокручивает» её: каждая
/// дополнительная страница запрашивается сигналом видимости sentinel.
///
/// Ошибкой завершается только первая страница. Упавшая догрузка
/// останавливает прокрутку, накопленное остаётся в ленте.
/// В режиме `--json` ничего не печатает: ленту выводит вызывающий.
async fn run_feed<S>(
    source: S,
    key: S::Key,
    page_size: u32,
    scroll: ScrollArgs,
    json: bool,
    render: fn(&[S::Item]),
) -> Result<FeedController<S>>
where
    S: PageSource,
{
    let controller = FeedController::new(source, page_size);
    let mut driver = FeedDriver::new(controller, SentinelObserver::default());
    driver.open(key);

    let mut shown = 0;
    let mut scrolls = 0;
    loop {
        if let Some(outcome) = driver.settle().await {
            debug!(?outcome, "feed page settled");
            if outcome == LoadOutcome::Failed {
                let reason = driver
                    .controller()
                    .last_error()
                    .unwrap_or("unknown error")
                    .to_string();
                if scrolls == 0 {
                    return Err(anyhow!("не удалось загрузить ленту: {reason}"));
                }
                warn!(error = %reason, loaded = shown, "load more failed, scrolling stopped");
                break;
            }
        }

        let items = driver.controller().items();
        if !json {
            render(&items[shown..]);
        }
        shown = items.len();

        if !wants_more(scroll, scrolls) || !driver.on_sentinel(1.0) {
            break;
        }
        scrolls += 1;
    }

    let controller = driver.into_controller();
    if !json {
        print_feed_footer(&controller);
    }
    Ok(controller)
}

fn wants_more(scroll: ScrollArgs, done: u32) -> bool {
    scroll.all || done < scroll.pages
}

async fn show_table<S>(
    mut table: PagedTable<S>,
    page: u32,
    json: bool,
    render: fn(&[S::Item]),
) -> Result<()>
where
    S: PageSource,
    S::Item: Serialize,
{
    if table.go_to(page).await == LoadOutcome::Failed {
        return Err(anyhow!("не удалось загрузить страницу {page}"));
    }
    if json {
        return print_json(&table.rows());
    }
    render(table.rows());
    let pager = table.pager();
    println!(
        "Страница {} из {} (всего {})",
        pager.current_page(),
        pager.total_pages().max(1),
        pager.total()
    );
    Ok(())
}

fn resolve_server(server: Option<String>, configured: &str) -> String {
    normalize_server(server.unwrap_or_else(|| configured.to_string()))
}

fn normalize_server(server: String) -> String {
    if server.starts_with("http://") || server.starts_with("https://") {
        return server;
    }

    format!("http://{server}")
}

fn non_empty(ids: Vec<i64>) -> Option<Vec<i64>> {
    (!ids.is_empty()).then_some(ids)
}

fn parse_token_content(raw: &str) -> Option<String> {
    let token = raw.trim().to_string();
    if token.is_empty() {
        return None;
    }
    Some(token)
}

fn load_token() -> io::Result<Option<String>> {
    if !Path::new(TOKEN_FILE).exists() {
        return Ok(None);
    }

    let raw = fs::read_to_string(TOKEN_FILE)?;
    Ok(parse_token_content(&raw))
}

fn persist_token(client: &BlogClient) -> io::Result<()> {
    if let Some(token) = client.get_token() {
        fs::write(TOKEN_FILE, token)?;
    }
    Ok(())
}

fn remove_token() -> io::Result<()> {
    match fs::remove_file(TOKEN_FILE) {
        Err(err) if err.kind() != io::ErrorKind::NotFound => Err(err),
        _ => Ok(()),
    }
}

fn map_client_error(err: ApiError) -> anyhow::Error {
    let message = match err {
        ApiError::Unauthorized => {
            "требуется авторизация: выполните `blog-feed login ...`".to_string()
        }
        ApiError::Http { status: 401, .. } => {
            "токен недействителен: выполните `blog-feed login ...` заново".to_string()
        }
        ApiError::Http { status: 404, .. } => "ресурс не найден".to_string(),
        ApiError::Http { status, message } => format!("ошибка HTTP {status}: {message}"),
        ApiError::Network(err) => format!("сервер недоступен: {err}"),
        ApiError::Decode(message) => format!("неожиданный ответ сервера: {message}"),
        ApiError::InvalidRequest(message) => format!("некорректный запрос: {message}"),
    };
    anyhow!(message)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("не удалось сериализовать ответ")?;
    println!("{rendered}");
    Ok(())
}

fn print_post(title: &str, post: &Post) {
    println!("{title}");
    println!("id: {}", post.id);
    println!("title: {}", post.title);
    println!("slug: {}", post.slug);
    println!("summary: {}", post.summary);
    println!("views: {}, read time: {} min", post.view_count, post.read_time_minutes);
    if !post.tags.is_empty() {
        let tags: Vec<&str> = post.tags.iter().map(|tag| tag.slug.as_str()).collect();
        println!("tags: {}", tags.join(", "));
    }
    println!("created_at: {}", post.created_at);
    println!("updated_at: {}", post.updated_at);
}

fn print_tag(title: &str, tag: &Tag) {
    println!("{title}");
    println!("id: {}", tag.id);
    println!("name: {}", tag.name);
    println!("slug: {}", tag.slug);
}

fn print_posts(posts: &[Post]) {
    for post in posts {
        println!(
            "- [{}] {} ({}, {} min)",
            post.id,
            post.title,
            post.created_at.format("%Y-%m-%d"),
            post.read_time_minutes
        );
    }
}

fn print_tags(tags: &[Tag]) {
    for tag in tags {
        println!("- [{}] {} ({})", tag.id, tag.name, tag.slug);
    }
}

fn print_comments(comments: &[Comment]) {
    for flat in flatten_comments(comments) {
        let comment = flat.comment;
        println!(
            "{}- [{}] {}: {} (likes={})",
            "  ".repeat(flat.depth),
            comment.id,
            comment.author_name,
            comment.content,
            comment.like_count
        );
    }
}

fn print_feed_footer<S: PageSource>(feed: &FeedController<S>) {
    let shown = feed.items().len();
    let mut line = match feed.total() {
        Some(total) => format!("Показано {shown} из {total}"),
        None => format!("Показано {shown}"),
    };
    if feed.is_exhausted() {
        line.push_str(", больше ничего нет");
    } else if let Some(reason) = feed.last_error() {
        line.push_str(&format!(", догрузка не удалась: {reason}"));
    }
    println!("{line}");
}
