#![cfg(feature = "db_tests")]
mod common;

use common::*;
use editorial::models::{
    Comment, Commenter, Post, PostChanges, PostStatus, TagCount, Teaser,
};
use editorial::seed::SeedData;

fn ids(teasers: &[Teaser]) -> Vec<i32> {
    teasers.iter().map(|t| t.id).collect()
}

fn choice_tags() -> Vec<String> {
    vec!["featured".into(), "editor-choice".into()]
}

#[tokio::test]
async fn latest_is_published_only() {
    let mut db = db().await;
    let a = author("ann", &mut db).await;
    let old = published(&a, "Old", days_ago(5), &[], &mut db).await;
    let new = published(&a, "New", days_ago(1), &[], &mut db).await;
    draft(&a, "Draft", &[], &mut db).await;
    let latest = Teaser::latest(5, &mut db).await.unwrap();
    assert_eq!(ids(&latest), [new.id, old.id]);
    assert_eq!(latest[0].url(), new.url());
    let latest = Teaser::latest(1, &mut db).await.unwrap();
    assert_eq!(ids(&latest), [new.id]);
}

#[tokio::test]
async fn comment_count_is_active_only() {
    let mut db = db().await;
    let a = author("ann", &mut db).await;
    let post = published(&a, "Talk", days_ago(1), &[], &mut db).await;
    let first = comment(&post, "Bo", "bo@example.com", &mut db).await;
    comment(&post, "Cy", "cy@example.com", &mut db).await;
    let count = |teasers: Vec<Teaser>| teasers[0].comment_count();
    assert_eq!(count(Teaser::latest(1, &mut db).await.unwrap()), 2);

    Comment::set_active(first.id, false, &mut db).await.unwrap();
    assert_eq!(count(Teaser::latest(1, &mut db).await.unwrap()), 1);
    Comment::set_active(first.id, true, &mut db).await.unwrap();
    assert_eq!(count(Teaser::latest(1, &mut db).await.unwrap()), 2);
}

#[tokio::test]
async fn teasers_have_tags() {
    let mut db = db().await;
    let a = author("ann", &mut db).await;
    let rust = tag("Rust", &mut db).await;
    let web = tag("Web", &mut db).await;
    published(&a, "Warp", days_ago(1), &[&web, &rust], &mut db).await;
    let latest = Teaser::latest(1, &mut db).await.unwrap();
    let names = latest[0].tags().iter().map(|t| &t.name).collect::<Vec<_>>();
    assert_eq!(names, ["Rust", "Web"]);
}

#[tokio::test]
async fn trending_window_and_order() {
    let mut db = db().await;
    let a = author("ann", &mut db).await;
    let quiet = published(&a, "Quiet", days_ago(1), &[], &mut db).await;
    let some = published(&a, "Some", days_ago(2), &[], &mut db).await;
    let many = published(&a, "Many", days_ago(10), &[], &mut db).await;
    let tie = published(&a, "Tie", days_ago(3), &[], &mut db).await;
    let ancient = published(&a, "Ancient", days_ago(40), &[], &mut db).await;
    let hidden = draft(&a, "Hidden", &[], &mut db).await;
    comments(&some, 1, &mut db).await;
    comments(&tie, 1, &mut db).await;
    comments(&many, 4, &mut db).await;
    comments(&ancient, 9, &mut db).await;
    comments(&hidden, 9, &mut db).await;

    let trending = Teaser::trending(days_ago(30), 1, 5, &mut db)
        .await
        .unwrap();
    assert_eq!(ids(&trending), [many.id, some.id, tie.id]);
    assert!(!ids(&trending).contains(&quiet.id));

    let picky = Teaser::trending(days_ago(30), 2, 5, &mut db).await.unwrap();
    assert_eq!(ids(&picky), [many.id]);
    let short = Teaser::trending(days_ago(5), 1, 5, &mut db).await.unwrap();
    assert_eq!(ids(&short), [some.id, tie.id]);
}

#[tokio::test]
async fn editors_choice_by_comments_or_tag() {
    let mut db = db().await;
    let a = author("ann", &mut db).await;
    let featured = tag_slug("featured", &mut db).await;
    let picked = tag_slug("editor-choice", &mut db).await;
    let other = tag("Other", &mut db).await;

    let busy = published(&a, "Busy", days_ago(4), &[&other], &mut db).await;
    let star =
        published(&a, "Star", days_ago(3), &[&featured, &picked], &mut db)
            .await;
    let both = published(&a, "Both", days_ago(2), &[&featured], &mut db).await;
    let almost = published(&a, "Almost", days_ago(1), &[&other], &mut db).await;
    let secret = draft(&a, "Secret", &[&featured], &mut db).await;
    comments(&busy, 3, &mut db).await;
    comments(&both, 5, &mut db).await;
    comments(&almost, 2, &mut db).await;
    comments(&secret, 5, &mut db).await;

    let choice = Teaser::editors_choice(3, &choice_tags(), 10, &mut db)
        .await
        .unwrap();
    assert_eq!(ids(&choice), [both.id, star.id, busy.id]);
    assert!(!ids(&choice).contains(&almost.id));

    let limited = Teaser::editors_choice(3, &choice_tags(), 1, &mut db)
        .await
        .unwrap();
    assert_eq!(ids(&limited), [both.id]);
}

#[tokio::test]
async fn search_title_body_and_tags() {
    let mut db = db().await;
    let a = author("ann", &mut db).await;
    let ai = tag("Artificial Intelligence", &mut db).await;
    let by_title = published(&a, "Intelligent design", days_ago(3), &[], &mut db)
        .await;
    let by_both =
        published(&a, "More intelligence", days_ago(2), &[&ai], &mut db).await;
    let by_tag = published(&a, "Robots", days_ago(1), &[&ai], &mut db).await;
    let new = editorial::models::NewPost {
        status: PostStatus::Published,
        publish: Some(days_ago(4)),
        ..editorial::models::NewPost::new(
            a.id,
            "Plain",
            "Talking about INTELLIGENCE here.",
        )
    };
    let by_body = Post::create(&new, &mut db).await.unwrap();
    draft(&a, "Intelligent draft", &[&ai], &mut db).await;
    published(&a, "Unrelated", days_ago(1), &[], &mut db).await;

    let found = Teaser::search("intellig", &mut db).await.unwrap();
    assert_eq!(
        ids(&found),
        [by_tag.id, by_both.id, by_title.id, by_body.id]
    );
    let found = Teaser::search("  ROBOTS ", &mut db).await.unwrap();
    assert_eq!(ids(&found), [by_tag.id]);
}

#[tokio::test]
async fn search_matching_many_tags_gives_post_once() {
    let mut db = db().await;
    let a = author("ann", &mut db).await;
    let ai = tag("AI", &mut db).await;
    let applied = tag("Applied AI", &mut db).await;
    let other = tag("Other", &mut db).await;
    let post =
        published(&a, "Robots", days_ago(1), &[&ai, &applied, &other], &mut db)
            .await;
    let found = Teaser::search("ai", &mut db).await.unwrap();
    assert_eq!(ids(&found), [post.id]);
    assert_eq!(found[0].tags().len(), 3);
}

#[tokio::test]
async fn search_blank_and_wildcards() {
    let mut db = db().await;
    let a = author("ann", &mut db).await;
    published(&a, "Anything", days_ago(1), &[], &mut db).await;
    let percent =
        published(&a, "Growth of 100% or more", days_ago(2), &[], &mut db)
            .await;

    assert!(Teaser::search("", &mut db).await.unwrap().is_empty());
    assert!(Teaser::search(" \t ", &mut db).await.unwrap().is_empty());
    let found = Teaser::search("%", &mut db).await.unwrap();
    assert_eq!(ids(&found), [percent.id]);
    assert!(Teaser::search("_", &mut db).await.unwrap().is_empty());
}

#[tokio::test]
async fn top_tags_order_and_exclusion() {
    let mut db = db().await;
    let a = author("ann", &mut db).await;
    let big = tag("Big", &mut db).await;
    let alpha = tag("Alpha", &mut db).await;
    let beta = tag("Beta", &mut db).await;
    let recent = tag("Recent", &mut db).await;
    let unused = tag("Unused", &mut db).await;
    let drafty = tag("Drafty", &mut db).await;

    published(&a, "One", days_ago(5), &[&big, &alpha, &beta], &mut db).await;
    published(&a, "Two", days_ago(4), &[&big], &mut db).await;
    published(&a, "Three", days_ago(1), &[&recent], &mut db).await;
    draft(&a, "Four", &[&drafty, &big], &mut db).await;

    let top = TagCount::top(10, &mut db).await.unwrap();
    let got = top
        .iter()
        .map(|c| (c.tag.name.as_str(), c.published_posts))
        .collect::<Vec<_>>();
    assert_eq!(
        got,
        [("Big", 2), ("Recent", 1), ("Alpha", 1), ("Beta", 1)]
    );
    assert!(top.iter().all(|c| c.tag.id != unused.id));

    let all = TagCount::all(&mut db).await.unwrap();
    assert_eq!(all.len(), 6);
    let drafty = all.iter().find(|c| c.tag.id == drafty.id).unwrap();
    assert_eq!(drafty.published_posts, 0);
    assert_eq!(drafty.latest_publish, None);

    assert_eq!(TagCount::top(1, &mut db).await.unwrap().len(), 1);
}

#[tokio::test]
async fn top_commenters() {
    let mut db = db().await;
    let a = author("ann", &mut db).await;
    let one = published(&a, "One", days_ago(2), &[], &mut db).await;
    let two = published(&a, "Two", days_ago(1), &[], &mut db).await;
    comment(&one, "Bo", "bo@example.com", &mut db).await;
    comment(&two, "Bo", "bo@example.com", &mut db).await;
    comment(&one, "Cy", "cy@example.com", &mut db).await;
    comment(&one, "Di", "di@example.com", &mut db).await;
    let gone = comment(&two, "Cy", "cy@example.com", &mut db).await;
    comment(&two, "Ed", "ed@example.com", &mut db).await;
    Comment::set_active(gone.id, false, &mut db).await.unwrap();

    let top = Commenter::top(3, &mut db).await.unwrap();
    let got = top
        .iter()
        .map(|c| (c.name.as_str(), c.comments_total))
        .collect::<Vec<_>>();
    assert_eq!(got, [("Bo", 2), ("Ed", 1), ("Di", 1)]);
    assert!(!top[0].avatar.is_empty());
}

#[tokio::test]
async fn related_by_shared_tags() {
    let mut db = db().await;
    let a = author("ann", &mut db).await;
    let x = tag("X", &mut db).await;
    let y = tag("Y", &mut db).await;
    let z = tag("Z", &mut db).await;
    let post = published(&a, "Main", days_ago(1), &[&x, &y], &mut db).await;
    let both = published(&a, "Both", days_ago(5), &[&x, &y], &mut db).await;
    let popular = published(&a, "Popular", days_ago(9), &[&y], &mut db).await;
    let newer = published(&a, "Newer", days_ago(2), &[&x], &mut db).await;
    published(&a, "Elsewhere", days_ago(1), &[&z], &mut db).await;
    draft(&a, "Unfinished", &[&x], &mut db).await;
    comments(&popular, 2, &mut db).await;

    let tags = editorial::models::Tag::for_post(post.id, &mut db)
        .await
        .unwrap();
    let related = Teaser::related(post.id, &tags, 3, &mut db).await.unwrap();
    assert_eq!(ids(&related), [popular.id, newer.id, both.id]);

    let related = Teaser::related(post.id, &tags, 1, &mut db).await.unwrap();
    assert_eq!(ids(&related), [popular.id]);
    assert!(Teaser::related(post.id, &[], 3, &mut db)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn tagged_pages() {
    let mut db = db().await;
    let a = author("ann", &mut db).await;
    let t = tag("Series", &mut db).await;
    let mut posts = Vec::new();
    for i in 0..5 {
        let title = format!("Part {i}");
        posts.push(published(&a, &title, days_ago(10 - i), &[&t], &mut db).await);
    }
    published(&a, "Untagged", days_ago(1), &[], &mut db).await;
    posts.reverse();
    let want = posts.iter().map(|p| p.id).collect::<Vec<_>>();

    let first = Teaser::tagged(t.id, 0, 2, &mut db).await.unwrap();
    assert_eq!(ids(&first), want[..2]);
    let last = Teaser::tagged(t.id, 4, 2, &mut db).await.unwrap();
    assert_eq!(ids(&last), want[4..]);
    let past = Teaser::tagged(t.id, 6, 2, &mut db).await.unwrap();
    assert!(past.is_empty());

    let all = Teaser::page(0, 10, &mut db).await.unwrap();
    assert_eq!(all.len(), 6);
}

#[tokio::test]
async fn unpublishing_hides_everywhere() {
    let mut db = db().await;
    let a = author("ann", &mut db).await;
    let featured = tag_slug("featured", &mut db).await;
    let post =
        published(&a, "Going away", days_ago(1), &[&featured], &mut db).await;
    comments(&post, 3, &mut db).await;
    Post::update(post.id, &PostChanges::status(PostStatus::Draft), &mut db)
        .await
        .unwrap();

    assert!(Teaser::latest(5, &mut db).await.unwrap().is_empty());
    assert!(Teaser::trending(days_ago(30), 1, 5, &mut db)
        .await
        .unwrap()
        .is_empty());
    assert!(Teaser::editors_choice(3, &choice_tags(), 5, &mut db)
        .await
        .unwrap()
        .is_empty());
    assert!(Teaser::search("going", &mut db).await.unwrap().is_empty());
    assert!(TagCount::top(5, &mut db).await.unwrap().is_empty());
}

#[tokio::test]
async fn seed_twice_is_stable() {
    let mut db = db().await;
    let data = SeedData::demo().unwrap();
    let now = chrono::Utc::now();
    let first = data.apply(false, now, &mut db).await.unwrap();
    assert_eq!(first.authors, 3);
    assert_eq!(first.tags, 15);
    assert_eq!(first.posts, 13);
    assert_eq!(first.published, 12);
    assert_eq!(first.comments, 27);
    assert_eq!(first.new_comments, 27);

    let second = data.apply(false, now, &mut db).await.unwrap();
    assert_eq!(second.comments, 27);
    assert_eq!(second.new_comments, 0);
    assert_eq!(Post::all(&mut db).await.unwrap().len(), 13);
    assert_eq!(Comment::counts(&mut db).await.unwrap(), (25, 2));

    let reset = data.apply(true, now, &mut db).await.unwrap();
    assert_eq!(reset.new_comments, 27);
}

#[tokio::test]
async fn failed_seed_writes_nothing() {
    let mut db = db().await;
    let data = SeedData::parse(
        r#"{
          "authors": [{"username": "ann", "name": "Ann", "email": ""}],
          "tags": [{"slug": "news", "name": "News"}],
          "posts": [{"slug": "hello", "title": "Hello", "body": "Hi",
                     "author": "nobody", "status": "published",
                     "tags": ["news"], "days_ago": 1}],
          "comments": []
        }"#,
    )
    .unwrap();
    let err = data.apply(false, chrono::Utc::now(), &mut db).await;
    assert!(err.is_err());
    assert!(TagCount::all(&mut db).await.unwrap().is_empty());
    assert!(Post::all(&mut db).await.unwrap().is_empty());
}
