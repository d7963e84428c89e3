mod common;

use assert_matches::assert_matches;
use collage_core::error::CoreError;
use collage_core::format::VideoFormat;
use collage_db::models::movie::CreateMovie;
use collage_db::repositories::MovieRepo;
use collage_pipeline::registration::{find_movie_file, register_all, register_folder, register_movie};
use collage_pipeline::PipelineError;
use common::{FakeMedia, Library};
use sqlx::SqlitePool;

#[sqlx::test(migrations = "../../db/migrations")]
async fn registers_the_single_movie_file(pool: SqlitePool) {
    let lib = Library::new(pool);
    let dir = lib.config.movie_dir("alpha");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("Alpha.MP4"), b"movie").unwrap();
    std::fs::write(dir.join("collage-old.mp4"), b"generated").unwrap();
    std::fs::write(dir.join("output.mkv"), b"generated").unwrap();
    std::fs::write(dir.join("notes.txt"), b"notes").unwrap();

    let media = FakeMedia::with_duration(3600.0);
    let movie = register_movie(&lib.pool, &lib.config, &media, "alpha", VideoFormat::basic(), None)
        .await
        .unwrap();

    assert_eq!(movie.filename, "Alpha.MP4");
    assert!((movie.duration() - 3600.0).abs() < 1e-9);
    assert!(movie.metadata.format.is_basic());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn ambiguous_or_missing_movie_file_is_rejected(pool: SqlitePool) {
    let lib = Library::new(pool);
    let dir = lib.config.movie_dir("alpha");
    std::fs::create_dir_all(&dir).unwrap();

    assert_matches!(
        find_movie_file(&dir),
        Err(PipelineError::Core(CoreError::Validation(_)))
    );

    std::fs::write(dir.join("a.mp4"), b"movie").unwrap();
    std::fs::write(dir.join("b.mkv"), b"movie").unwrap();
    assert_matches!(
        find_movie_file(&dir),
        Err(PipelineError::Core(CoreError::Validation(_)))
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn explicit_file_resolves_ambiguity(pool: SqlitePool) {
    let lib = Library::new(pool);
    let dir = lib.config.movie_dir("alpha");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("a.mp4"), b"movie").unwrap();
    std::fs::write(dir.join("b.mkv"), b"movie").unwrap();

    let media = FakeMedia::with_duration(100.0);
    let movie = register_movie(
        &lib.pool,
        &lib.config,
        &media,
        "alpha",
        VideoFormat::basic(),
        Some("b.mkv"),
    )
    .await
    .unwrap();
    assert_eq!(movie.filename, "b.mkv");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn unknown_format_is_rejected(pool: SqlitePool) {
    let lib = Library::new(pool);
    let format = VideoFormat {
        fov: "200".to_string(),
        orientation: "sbs".to_string(),
        perspective: "normal".to_string(),
    };
    let media = FakeMedia::with_duration(100.0);

    let result = register_movie(&lib.pool, &lib.config, &media, "alpha", format, None).await;
    assert_matches!(result, Err(PipelineError::Core(CoreError::UnsupportedFormat(_))));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn missing_folder_is_rejected(pool: SqlitePool) {
    let lib = Library::new(pool);
    let media = FakeMedia::with_duration(100.0);

    let result =
        register_movie(&lib.pool, &lib.config, &media, "ghost", VideoFormat::basic(), None).await;
    assert_matches!(result, Err(PipelineError::Core(CoreError::Validation(_))));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn re_registering_keeps_extra_metadata(pool: SqlitePool) {
    let lib = Library::new(pool);
    let mut movie = common::add_movie(&lib, "alpha", 100.0, VideoFormat::basic()).await;
    movie
        .metadata
        .extra
        .insert("title".to_string(), serde_json::json!("Alpha"));
    MovieRepo::upsert(
        &lib.pool,
        &CreateMovie {
            folder: movie.folder.clone(),
            filename: movie.filename.clone(),
            metadata: movie.metadata.0.clone(),
        },
    )
    .await
    .unwrap();

    let media = FakeMedia::with_duration(250.0);
    let refreshed = register_movie(&lib.pool, &lib.config, &media, "alpha", VideoFormat::basic(), None)
        .await
        .unwrap();

    assert_eq!(refreshed.id, movie.id);
    assert!((refreshed.duration() - 250.0).abs() < 1e-9);
    assert_eq!(refreshed.metadata.extra["title"], "Alpha");
}

// -- bulk registration --

fn write_movie(lib: &Library, folder: &str, relative: &str) {
    let path = lib.config.movie_dir(folder).join(relative);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, b"movie").unwrap();
}

fn write_folder_file(lib: &Library, folder: &str, name: &str, content: &str) {
    std::fs::write(lib.config.movie_dir(folder).join(name), content).unwrap();
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn register_all_walks_every_folder(pool: SqlitePool) {
    let lib = Library::new(pool);
    write_movie(&lib, "bravo", "disc1/Bravo.mkv");
    write_folder_file(&lib, "bravo", "format", "180,sbs,fisheye\n");
    write_movie(&lib, "alpha", "Alpha.180x180_3dh.mp4");
    write_movie(&lib, "charlie", "charlie.mp4");
    write_folder_file(
        &lib,
        "charlie",
        "metadata.yaml",
        "format:\n  fov: 360\n  orientation: ab\n  perspective: normal\ntitle: Charlie\n",
    );
    std::fs::write(lib.config.raw_dir.join("notes.txt"), b"not a folder").unwrap();

    let media = FakeMedia::with_duration(600.0);
    let movies = register_all(&lib.pool, &lib.config, &media).await.unwrap();

    let folders: Vec<&str> = movies.iter().map(|m| m.folder.as_str()).collect();
    assert_eq!(folders, ["alpha", "bravo", "charlie"]);

    assert!(movies[0].metadata.format.is_basic());
    assert_eq!(movies[1].filename, "disc1/Bravo.mkv");
    assert_eq!(movies[1].metadata.format.perspective, "fisheye");
    assert_eq!(movies[2].metadata.format.fov, "360");
    assert_eq!(movies[2].metadata.extra["title"], "Charlie");
    assert!(movies.iter().all(|m| (m.duration() - 600.0).abs() < 1e-9));

    assert_eq!(MovieRepo::list(&lib.pool).await.unwrap().len(), 3);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn overrides_name_the_file_and_skip_probing(pool: SqlitePool) {
    let lib = Library::new(pool);
    write_movie(&lib, "alpha", "a.mp4");
    write_movie(&lib, "alpha", "extras/b.mp4");
    write_folder_file(
        &lib,
        "alpha",
        "metadata.yaml",
        "file: extras/b.mp4\nformat:\n  fov: '180'\n  orientation: sbs\n  perspective: normal\nvideo:\n  duration: 42.5\n  width: 3840\n  height: 1920\n",
    );

    let media = FakeMedia::with_duration(600.0);
    let movie = register_folder(&lib.pool, &lib.config, &media, "alpha").await.unwrap();

    assert_eq!(movie.filename, "extras/b.mp4");
    assert!((movie.duration() - 42.5).abs() < 1e-9);
    assert_eq!(movie.metadata.video.width, 3840);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn absolute_override_file_is_stored_relative(pool: SqlitePool) {
    let lib = Library::new(pool);
    write_movie(&lib, "alpha", "sub/a.mp4");
    let absolute = lib.config.movie_dir("alpha").join("sub").join("a.mp4");
    write_folder_file(
        &lib,
        "alpha",
        "metadata.yaml",
        &format!("file: {}\n", absolute.display()),
    );
    write_folder_file(&lib, "alpha", "format", "180,sbs,normal");

    let media = FakeMedia::with_duration(100.0);
    let movie = register_folder(&lib.pool, &lib.config, &media, "alpha").await.unwrap();
    assert_eq!(movie.filename, "sub/a.mp4");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn unknown_format_aborts_bulk_registration(pool: SqlitePool) {
    let lib = Library::new(pool);
    write_movie(&lib, "alpha", "alpha.mp4");

    let media = FakeMedia::with_duration(100.0);
    assert_matches!(
        register_all(&lib.pool, &lib.config, &media).await,
        Err(PipelineError::Core(CoreError::UnsupportedFormat(_)))
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn bad_override_files_are_rejected(pool: SqlitePool) {
    let lib = Library::new(pool);
    let media = FakeMedia::with_duration(100.0);

    write_movie(&lib, "alpha", "alpha.mp4");
    write_folder_file(&lib, "alpha", "metadata.yaml", "format: [not, a, map\n");
    assert_matches!(
        register_folder(&lib.pool, &lib.config, &media, "alpha").await,
        Err(PipelineError::Core(CoreError::Validation(_)))
    );

    write_movie(&lib, "bravo", "bravo.mp4");
    write_folder_file(&lib, "bravo", "metadata.yaml", "file: missing.mp4\n");
    assert_matches!(
        register_folder(&lib.pool, &lib.config, &media, "bravo").await,
        Err(PipelineError::Core(CoreError::Validation(_)))
    );

    write_movie(&lib, "charlie", "charlie.mp4");
    write_folder_file(&lib, "charlie", "format", "180,sbs");
    assert_matches!(
        register_folder(&lib.pool, &lib.config, &media, "charlie").await,
        Err(PipelineError::Core(CoreError::Validation(_)))
    );

    write_movie(&lib, "delta", "delta.mp4");
    write_folder_file(&lib, "delta", "format", "200,sbs,normal");
    assert_matches!(
        register_folder(&lib.pool, &lib.config, &media, "delta").await,
        Err(PipelineError::Core(CoreError::UnsupportedFormat(_)))
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn nested_movie_file_is_found(pool: SqlitePool) {
    let lib = Library::new(pool);
    write_movie(&lib, "alpha", "Some.Release/Alpha.mp4");
    write_movie(&lib, "alpha", "Some.Release/output-preview.mp4");

    assert_eq!(
        find_movie_file(&lib.config.movie_dir("alpha")).unwrap(),
        "Some.Release/Alpha.mp4"
    );
}
