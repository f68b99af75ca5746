use anyhow::{anyhow, Result};
use clap::value_parser;
use clap::{Arg, ArgAction, ArgMatches, Command};

use crate::cli::utils::{opt_to_string, short_msg, timestamp_to_string};
use crate::music_rpc::model::{GenerateRequest, PageQuery};
use crate::music_rpc::rpc::{get_music_api, MusicServiceRpcClient};
use entity::music_tasks::Model as Music;
use entity::{GenerateMode, MusicStatus};
use tabled::builder::Builder;
use tabled::settings::style::Style;

pub fn music_cmds<'a>() -> Command<'a> {
    Command::new("music")
        .arg_required_else_help(true)
        .about("music task command")
        .subcommand(
            Command::new("list")
                .about("list music tasks page by page")
                .args(&[
                    Arg::new("user-id")
                        .long("user-id")
                        .takes_value(true)
                        .value_parser(value_parser!(i64))
                        .help("only tasks of this user"),
                    Arg::new("title")
                        .long("title")
                        .takes_value(true)
                        .help("title contains"),
                    Arg::new("status")
                        .long("status")
                        .takes_value(true)
                        .value_parser(value_parser!(i32))
                        .help("InProgress = 10\nSuccess = 20"),
                    Arg::new("mode")
                        .long("mode")
                        .takes_value(true)
                        .value_parser(value_parser!(i32))
                        .help("Description = 1\nLyric = 2"),
                    Arg::new("public-status")
                        .long("public-status")
                        .takes_value(true)
                        .value_parser(value_parser!(bool))
                        .help("only public or private tasks"),
                    Arg::new("page-no")
                        .long("page-no")
                        .takes_value(true)
                        .default_value("1")
                        .value_parser(value_parser!(u64)),
                    Arg::new("page-size")
                        .long("page-size")
                        .takes_value(true)
                        .default_value("20")
                        .value_parser(value_parser!(u64)),
                ]),
        )
        .subcommand(
            Command::new("get")
                .about("get music task detail")
                .args(&[Arg::new("id")
                    .last(true)
                    .takes_value(true)
                    .required(true)
                    .value_parser(value_parser!(i64))
                    .help("music task id")]),
        )
        .subcommand(
            Command::new("delete")
                .about("delete music task")
                .args(&[Arg::new("id")
                    .last(true)
                    .takes_value(true)
                    .required(true)
                    .value_parser(value_parser!(i64))
                    .help("music task id")]),
        )
        .subcommand(
            Command::new("public")
                .about("change visibility of music task")
                .args(&[
                    Arg::new("id")
                        .long("id")
                        .takes_value(true)
                        .required(true)
                        .value_parser(value_parser!(i64)),
                    Arg::new("public-status")
                        .long("public-status")
                        .takes_value(true)
                        .required(true)
                        .value_parser(value_parser!(bool)),
                ]),
        )
        .subcommand(Command::new("sync").about("sync in-progress music tasks now"))
        .subcommand(
            Command::new("generate")
                .about("generate music")
                .args(&[
                    Arg::new("mode")
                        .long("mode")
                        .takes_value(true)
                        .required(true)
                        .value_parser(value_parser!(i32))
                        .help("Description = 1\nLyric = 2"),
                    Arg::new("prompt")
                        .long("prompt")
                        .takes_value(true)
                        .required(true)
                        .help("lyric in lyric mode, description in description mode"),
                    Arg::new("model")
                        .long("model")
                        .takes_value(true)
                        .default_value("chirp-v3-5"),
                    Arg::new("tags")
                        .long("tags")
                        .multiple_values(true)
                        .takes_value(true)
                        .help("music style, lyric mode only"),
                    Arg::new("title")
                        .long("title")
                        .takes_value(true)
                        .default_value("")
                        .help("lyric mode only"),
                    Arg::new("instrumental")
                        .long("instrumental")
                        .takes_value(false)
                        .action(ArgAction::SetTrue)
                        .help("no vocal, description mode only"),
                    Arg::new("user-id")
                        .long("user-id")
                        .takes_value(true)
                        .default_value("0")
                        .value_parser(value_parser!(i64)),
                    Arg::new("platform")
                        .long("platform")
                        .takes_value(true)
                        .help("defaults to the platform of the daemon"),
                ]),
        )
        .subcommand(Command::new("limit").about("show remaining provider credits"))
        .subcommand(
            Command::new("lyrics")
                .about("let the provider write lyrics")
                .args(&[Arg::new("prompt")
                    .long("prompt")
                    .takes_value(true)
                    .required(true)]),
        )
}

pub async fn music_command(music_m: &ArgMatches) -> Result<()> {
    match music_m.subcommand() {
        Some(("list", sub_m)) => list_music(sub_m).await,
        Some(("get", sub_m)) => get_music(sub_m).await,
        Some(("delete", sub_m)) => delete_music(sub_m).await,
        Some(("public", sub_m)) => update_public_status(sub_m).await,
        Some(("sync", sub_m)) => sync_music(sub_m).await,
        Some(("generate", sub_m)) => generate_music(sub_m).await,
        Some(("limit", sub_m)) => get_limit(sub_m).await,
        Some(("lyrics", sub_m)) => generate_lyrics(sub_m).await,
        _ => Err(anyhow!("command not found")),
    }
}

fn url_of(sub_m: &ArgMatches) -> Result<String> {
    sub_m
        .get_one::<String>("url")
        .cloned()
        .ok_or_else(|| anyhow!("url flag not found"))
}

fn id_of(sub_m: &ArgMatches) -> Result<i64> {
    sub_m
        .get_one::<i64>("id")
        .copied()
        .ok_or_else(|| anyhow!("id argument not found"))
}

pub async fn list_music(sub_m: &ArgMatches) -> Result<()> {
    let status = match sub_m.get_one::<i32>("status") {
        Some(v) => Some(MusicStatus::try_from(*v).map_err(|_| anyhow!("unknown status {}", v))?),
        None => None,
    };
    let generate_mode = match sub_m.get_one::<i32>("mode") {
        Some(v) => Some(GenerateMode::try_from(*v).map_err(|_| anyhow!("unknown mode {}", v))?),
        None => None,
    };
    let query = PageQuery {
        page_no: sub_m.get_one::<u64>("page-no").copied().unwrap_or(1),
        page_size: sub_m.get_one::<u64>("page-size").copied().unwrap_or(20),
        user_id: sub_m.get_one::<i64>("user-id").copied(),
        title: sub_m.get_one::<String>("title").cloned(),
        status,
        generate_mode,
        public_status: sub_m.get_one::<bool>("public-status").copied(),
    };

    let server_api = get_music_api(url_of(sub_m)?).await?;
    let page = server_api.get_page(query).await?;
    print_music(page.list)?;
    println!("total {}", page.total);
    Ok(())
}

pub async fn get_music(sub_m: &ArgMatches) -> Result<()> {
    let server_api = get_music_api(url_of(sub_m)?).await?;
    let music = server_api.get(id_of(sub_m)?).await?;
    print_one_music(music)
}

pub async fn delete_music(sub_m: &ArgMatches) -> Result<()> {
    let id = id_of(sub_m)?;
    let server_api = get_music_api(url_of(sub_m)?).await?;
    server_api.delete(id).await?;
    println!("delete music task {} success", id);
    Ok(())
}

pub async fn update_public_status(sub_m: &ArgMatches) -> Result<()> {
    let public_status = *sub_m
        .get_one::<bool>("public-status")
        .ok_or_else(|| anyhow!("public-status flag not found"))?;
    let server_api = get_music_api(url_of(sub_m)?).await?;
    server_api
        .update_public_status(id_of(sub_m)?, public_status)
        .await?;
    println!("update public status success");
    Ok(())
}

pub async fn sync_music(sub_m: &ArgMatches) -> Result<()> {
    let server_api = get_music_api(url_of(sub_m)?).await?;
    let count = server_api.sync().await?;
    println!("{} music tasks in progress were synced", count);
    Ok(())
}

pub async fn generate_music(sub_m: &ArgMatches) -> Result<()> {
    let request = GenerateRequest {
        platform: sub_m.get_one::<String>("platform").cloned(),
        generate_mode: *sub_m
            .get_one::<i32>("mode")
            .ok_or_else(|| anyhow!("mode flag not found"))?,
        prompt: sub_m
            .get_one::<String>("prompt")
            .cloned()
            .ok_or_else(|| anyhow!("prompt flag not found"))?,
        model: sub_m
            .get_one::<String>("model")
            .cloned()
            .unwrap_or_default(),
        tags: sub_m
            .get_many::<String>("tags")
            .map(|v| v.cloned().collect())
            .unwrap_or_default(),
        title: sub_m
            .get_one::<String>("title")
            .cloned()
            .unwrap_or_default(),
        make_instrumental: sub_m
            .get_one::<bool>("instrumental")
            .copied()
            .unwrap_or(false),
    };
    let user_id = sub_m.get_one::<i64>("user-id").copied().unwrap_or_default();

    let server_api = get_music_api(url_of(sub_m)?).await?;
    let ids = server_api.generate(user_id, request).await?;
    if ids.is_empty() {
        println!("provider returned no music");
    }
    for id in ids {
        println!("{}", id);
    }
    Ok(())
}

pub async fn get_limit(sub_m: &ArgMatches) -> Result<()> {
    let server_api = get_music_api(url_of(sub_m)?).await?;
    let limit = server_api.get_limit().await?;

    let mut table = Builder::new();
    table
        .set_header(["Name", "Value"])
        .push_record(["CreditsLeft", limit.credits_left.to_string().as_str()])
        .push_record(["Period", opt_to_string(&limit.period).as_str()])
        .push_record(["MonthlyLimit", limit.monthly_limit.to_string().as_str()])
        .push_record(["MonthlyUsage", limit.monthly_usage.to_string().as_str()]);
    println!("{}", table.build().with(Style::ascii()));
    Ok(())
}

pub async fn generate_lyrics(sub_m: &ArgMatches) -> Result<()> {
    let prompt = sub_m
        .get_one::<String>("prompt")
        .cloned()
        .ok_or_else(|| anyhow!("prompt flag not found"))?;
    let server_api = get_music_api(url_of(sub_m)?).await?;
    let lyrics = server_api.generate_lyrics(prompt).await?;
    println!("{}\n\n{}", lyrics.title, lyrics.text);
    Ok(())
}

fn print_music(musics: Vec<Music>) -> Result<()> {
    let mut builder = Builder::new();

    builder.set_header([
        "Id", "TaskId", "User", "Mode", "Status", "Public", "Title", "Tags", "Audio", "CreateAt",
    ]);

    for music in musics {
        builder.push_record([
            music.id.to_string().as_str(),
            music.task_id.as_str(),
            music.user_id.to_string().as_str(),
            music.generate_mode.to_string().as_str(),
            music.status.to_string().as_str(),
            music.public_status.to_string().as_str(),
            short_msg(&music.title, 20).as_str(),
            short_msg(&music.tags.0.join(","), 20).as_str(),
            opt_to_string(&music.audio_url).as_str(),
            timestamp_to_string(music.create_at).as_str(),
        ]);
    }
    println!("{}", builder.build().with(Style::ascii()));
    Ok(())
}

fn print_one_music(music: Music) -> Result<()> {
    let mut table = Builder::new();

    table
        .set_header(["Name", "Value"])
        .push_record(["Id", music.id.to_string().as_str()])
        .push_record(["TaskId", music.task_id.as_str()])
        .push_record(["UserId", music.user_id.to_string().as_str()])
        .push_record(["Platform", music.platform.as_str()])
        .push_record(["Mode", music.generate_mode.to_string().as_str()])
        .push_record(["Model", music.model.as_str()])
        .push_record(["Status", music.status.to_string().as_str()])
        .push_record(["Public", music.public_status.to_string().as_str()])
        .push_record(["Title", music.title.as_str()])
        .push_record(["Tags", music.tags.0.join(",").as_str()])
        .push_record(["Prompt", short_msg(&music.prompt, 60).as_str()])
        .push_record(["Description", short_msg(&music.description_prompt, 60).as_str()])
        .push_record(["Lyric", short_msg(&music.lyric, 60).as_str()])
        .push_record(["Audio", opt_to_string(&music.audio_url).as_str()])
        .push_record(["Video", opt_to_string(&music.video_url).as_str()])
        .push_record(["Image", opt_to_string(&music.image_url).as_str()])
        .push_record(["CreateAt", timestamp_to_string(music.create_at).as_str()])
        .push_record(["UpdateAt", timestamp_to_string(music.update_at).as_str()]);

    println!("{}", table.build().with(Style::ascii()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> ArgMatches {
        Command::new("musicproxy")
            .arg(Arg::new("url").long("url").global(true).default_value("127.0.0.1:18888"))
            .subcommand(music_cmds())
            .get_matches_from(args)
    }

    #[test]
    fn parse_generate_args() {
        let m = parse(&[
            "musicproxy", "music", "generate", "--mode", "2", "--prompt", "[Verse] hi", "--tags",
            "pop", "rock",
        ]);
        let (_, music_m) = m.subcommand().unwrap();
        let (name, gen_m) = music_m.subcommand().unwrap();
        assert_eq!(name, "generate");
        assert_eq!(gen_m.get_one::<i32>("mode"), Some(&2));
        assert_eq!(gen_m.get_one::<String>("model").unwrap(), "chirp-v3-5");
        assert_eq!(
            gen_m.get_many::<String>("tags").unwrap().cloned().collect::<Vec<_>>(),
            vec!["pop".to_string(), "rock".to_string()]
        );
        assert_eq!(gen_m.get_one::<bool>("instrumental"), Some(&false));
        assert_eq!(url_of(gen_m).unwrap(), "127.0.0.1:18888");
    }

    #[test]
    fn parse_public_args() {
        let m = parse(&[
            "musicproxy", "music", "public", "--id", "12", "--public-status", "true",
        ]);
        let (_, music_m) = m.subcommand().unwrap();
        let (_, public_m) = music_m.subcommand().unwrap();
        assert_eq!(id_of(public_m).unwrap(), 12);
        assert_eq!(public_m.get_one::<bool>("public-status"), Some(&true));
    }
}
