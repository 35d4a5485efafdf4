#![allow(missing_docs)]
#![cfg(feature = "download")]

use std::{fs, path::Path};

use fedstack::{
    FedstackError,
    disk_cache::FedstackDiskCache,
    examples::{Examples, Feature},
    federated::{BlobFormat, SqliteClientStore},
    stackoverflow::{self, SPLITS, Split},
    tokenizer::TokenizerOptions,
};
use tempdir::TempDir;

fn post_examples(posts: &[(&str, &str)]) -> Examples {
    let n = posts.len();
    Examples::new()
        .with_feature(
            "creation_date",
            Feature::bytes_from(vec!["2018-02-28 19:06:18.34 UTC"; n]),
        )
        .with_feature("title", Feature::bytes_from(vec!["title"; n]))
        .with_feature("score", Feature::Int64(vec![3; n]))
        .with_feature("tags", Feature::bytes_from(vec!["rust|sqlite"; n]))
        .with_feature(
            "tokens",
            Feature::bytes_from(posts.iter().map(|(tokens, _)| *tokens)),
        )
        .with_feature("type", Feature::bytes_from(posts.iter().map(|(_, t)| *t)))
}

/// Lay out a cache dir as if every split and the vocab had been downloaded.
fn populate_cache(cache_dir: &Path) -> anyhow::Result<()> {
    let so_dir = cache_dir.join("stackoverflow");
    fs::create_dir_all(&so_dir)?;

    let alice = post_examples(&[("the cat", "question"), ("a dog", "answer"), ("", "answer")]);
    let bob = post_examples(&[("the the zebra", "question")]);
    // `train` holds JSON blobs; the other splits use the published msgpack+zlib blobs.
    for split in SPLITS {
        let format = match split {
            Split::Train => BlobFormat::Json,
            _ => BlobFormat::MsgpackZlib,
        };
        SqliteClientStore::create_with_format(
            so_dir.join(split.file_name()),
            format,
            [(b"alice".as_slice(), &alice), (b"bob".as_slice(), &bob)],
        )?;
    }

    fs::write(
        so_dir.join("stackoverflow.word_count"),
        "the 100\na 50\ncat 10\ndog 5\n",
    )?;
    Ok(())
}

#[test]
fn test_load_split_from_cache() -> anyhow::Result<()> {
    let dir = TempDir::new("fedstack-pipeline")?;
    populate_cache(dir.path())?;

    let train = stackoverflow::load_split("train", "sqlite", Some(dir.path()))?;
    assert_eq!(train.num_clients()?, 2);
    assert_eq!(train.client_ids()?, vec![b"alice".to_vec(), b"bob".to_vec()]);

    let raw = train.get_client(b"alice")?;
    assert_eq!(raw.num_features(), 6);
    assert_eq!(raw.num_examples()?, 3);
    Ok(())
}

#[test]
fn test_load_split_argument_errors() -> anyhow::Result<()> {
    let dir = TempDir::new("fedstack-pipeline")?;

    assert!(matches!(
        stackoverflow::load_split("validation", "sqlite", None),
        Err(FedstackError::InvalidSplit(_))
    ));
    assert!(matches!(
        stackoverflow::load_split("train", "tff", Some(dir.path())),
        Err(FedstackError::InvalidArgument(_))
    ));
    assert!(matches!(
        stackoverflow::load_split("train", "tff", None),
        Err(FedstackError::UnsupportedMode(_))
    ));
    Ok(())
}

#[test]
fn test_load_data_and_tokenize() -> anyhow::Result<()> {
    let dir = TempDir::new("fedstack-pipeline")?;
    populate_cache(dir.path())?;

    let (train, held_out, test) = stackoverflow::load_data("sqlite", Some(dir.path()))?;
    for data in [&train, &held_out, &test] {
        assert_eq!(data.num_clients()?, 2);
    }

    let alice = train.get_client(b"alice")?;
    assert_eq!(alice.names().collect::<Vec<_>>(), vec!["domain_id", "tokens"]);
    assert_eq!(alice.int32("domain_id")?, &[0, 1, 1]);
    assert_eq!(held_out.get_client(b"alice")?, alice);
    assert_eq!(test.get_client(b"bob")?.int32("domain_id")?, &[0]);

    let mut disk_cache = FedstackDiskCache::with_cache_dir(Some(dir.path()))?;
    let tokenizer = TokenizerOptions::default()
        .with_vocab_size(Some(3))
        .with_num_oov_buckets(1)
        .load(&mut disk_cache)?;
    assert_eq!(tokenizer.vocab_size(), 3);
    assert_eq!(tokenizer.total_size(), 7);

    let train = train.preprocess_batch(tokenizer.as_preprocess_batch(4));
    let batches = train.client_batches(b"alice", 2)?;
    assert_eq!(batches.len(), 2);

    // the=3, a=4, cat=5; "dog" is past the vocab and lands in the single oov bucket.
    let first = &batches[0];
    assert_eq!(first.int32("domain_id")?, &[0, 1]);
    assert_eq!(first.get("x").and_then(|x| x.row(0)), Some([1, 3, 5, 0].as_slice()));
    assert_eq!(first.get("y").and_then(|y| y.row(0)), Some([3, 5, 2, 0].as_slice()));
    assert_eq!(first.get("x").and_then(|x| x.row(1)), Some([1, 4, 6, 0].as_slice()));
    assert_eq!(first.get("y").and_then(|y| y.row(1)), Some([4, 6, 2, 0].as_slice()));

    let second = &batches[1];
    assert_eq!(second.get("x").and_then(|x| x.row(0)), Some([1, 0, 0, 0].as_slice()));
    assert_eq!(second.get("y").and_then(|y| y.row(0)), Some([2, 0, 0, 0].as_slice()));

    let bob = train.client_batches(b"bob", 8)?;
    assert_eq!(bob[0].get("x").and_then(|x| x.row(0)), Some([1, 3, 3, 6].as_slice()));
    assert_eq!(bob[0].get("y").and_then(|y| y.row(0)), Some([3, 3, 6, 2].as_slice()));
    Ok(())
}
