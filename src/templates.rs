use maud::{DOCTYPE, Markup, html};

use crate::{
    entities::{category, genre, movie},
    models::{MovieDetail, ReviewNode},
};

const TAILWIND_CDN: &str = "https://cdn.tailwindcss.com";

/// Which sidebar link is active on the movie list.
#[derive(Clone, Copy, Debug, Default)]
pub struct ListSelection<'a> {
    pub category: Option<&'a str>,
    pub genre: Option<&'a str>,
}

pub fn index_page(
    movies: &[movie::Model],
    categories: &[category::Model],
    genres: &[genre::Model],
    selection: ListSelection<'_>,
    media_url: &str,
) -> String {
    page(
        "Movies",
        html! {
            div class="min-h-screen bg-gray-50" {
                div class="max-w-6xl mx-auto px-6 py-10 flex gap-10" {
                    aside class="w-56 shrink-0 space-y-8" {
                        (filter_list(category::VERBOSE_NAME_PLURAL, "category", categories.iter().map(|c| (c.url.as_str(), c.name.as_str())), selection.category))
                        (filter_list(genre::VERBOSE_NAME_PLURAL, "genre", genres.iter().map(|g| (g.url.as_str(), g.name.as_str())), selection.genre))
                    }

                    main class="flex-1" {
                        div class="flex items-start justify-between" {
                            h1 class="text-3xl font-bold text-gray-900 capitalize" { (movie::VERBOSE_NAME_PLURAL) }
                            @if selection.category.is_some() || selection.genre.is_some() {
                                a class="text-sm text-blue-600 hover:text-blue-800" href="/" { "All movies" }
                            }
                        }

                        @if movies.is_empty() {
                            div class="mt-10 bg-white shadow rounded-lg p-8" {
                                p class="text-gray-600" { "No movies found." }
                            }
                        } @else {
                            div class="mt-8 grid gap-6 sm:grid-cols-2 lg:grid-cols-3" {
                                @for movie in movies {
                                    (movie_card(movie, media_url))
                                }
                            }
                        }
                    }
                }
            }
        },
    )
}

pub fn movie_page(detail: &MovieDetail, media_url: &str) -> String {
    let movie = &detail.movie;
    let rating = match detail.rating.average {
        Some(avg) => format!("{avg:.1} ({} votes)", detail.rating.votes),
        None => "no votes yet".to_string(),
    };
    page(
        &movie.title,
        html! {
            div class="min-h-screen bg-gray-50" {
                div class="max-w-4xl mx-auto px-6 py-10" {
                    a class="text-sm text-blue-600 hover:text-blue-800" href="/" { "← All movies" }

                    div class="mt-6 bg-white shadow rounded-lg p-8 flex gap-8" {
                        img class="w-48 rounded" src=(media(media_url, &movie.poster)) alt=(movie.title);
                        div class="space-y-2" {
                            h1 class="text-3xl font-bold text-gray-900" {
                                (movie.title)
                                span class="ml-2 font-normal text-gray-500" { "(" (movie.year) ")" }
                            }
                            @if !movie.tagline.is_empty() {
                                p class="italic text-gray-600" { "“" (movie.tagline) "”" }
                            }
                            (fact("Country", &movie.country))
                            (fact("World premiere", &movie.world_premiere))
                            @if let Some(category) = &detail.category {
                                (fact("Category", &category.name))
                            }
                            (fact("Genres", &join(detail.genres.iter().map(|g| g.name.as_str()))))
                            (fact("Directors", &join(detail.directors.iter().map(|a| a.name.as_str()))))
                            (fact("Starring", &join(detail.actors.iter().map(|a| a.name.as_str()))))
                            (fact("Budget", &format_usd(movie.budget)))
                            (fact("Box office (USA)", &format_usd(movie.fees_in_usa)))
                            (fact("Box office (world)", &format_usd(movie.fees_in_world)))
                            (fact("Rating", &rating))
                        }
                    }

                    div class="mt-6 bg-white shadow rounded-lg p-8" {
                        p class="text-gray-700 whitespace-pre-line" { (movie.description) }
                    }

                    @if !detail.shots.is_empty() {
                        div class="mt-6 grid gap-4 grid-cols-2 md:grid-cols-3" {
                            @for shot in &detail.shots {
                                figure class="bg-white shadow rounded-lg p-2" {
                                    img class="rounded" src=(media(media_url, &shot.image)) alt=(shot.title);
                                    figcaption class="mt-1 text-sm text-gray-600" { (shot.title) }
                                }
                            }
                        }
                    }

                    div class="mt-6 bg-white shadow rounded-lg p-8" {
                        h2 class="text-xl font-semibold text-gray-900" { "Reviews" }
                        @if detail.reviews.is_empty() {
                            p class="mt-2 text-sm text-gray-500" { "No reviews yet." }
                        } @else {
                            div class="mt-4 space-y-4" {
                                @for node in &detail.reviews {
                                    (review_thread(node))
                                }
                            }
                        }
                    }
                }
            }
        },
    )
}

pub fn error_page(message: String) -> String {
    page(
        "Error",
        html! {
            div class="min-h-screen bg-gray-50 flex items-center justify-center" {
                div class="max-w-xl w-full px-6" {
                    div class="bg-white shadow rounded-lg p-8" {
                        h1 class="text-2xl font-bold text-gray-900" { "Error" }
                        p class="mt-4 text-gray-700" { (message) }
                        a class="mt-6 inline-block text-blue-600 hover:text-blue-800" href="/" { "Back" }
                    }
                }
            }
        },
    )
}

fn page(title: &str, body: Markup) -> String {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (title) }
                script src=(TAILWIND_CDN) {}
            }
            body { (body) }
        }
    }
    .into_string()
}

fn filter_list<'a>(
    label: &str,
    param: &str,
    items: impl Iterator<Item = (&'a str, &'a str)>,
    selected: Option<&str>,
) -> Markup {
    html! {
        div {
            h2 class="text-sm font-semibold uppercase tracking-wide text-gray-500" { (label) }
            ul class="mt-2 space-y-1" {
                @for (url, name) in items {
                    li {
                        @let class = if selected == Some(url) { "font-semibold text-gray-900" } else { "text-blue-600 hover:text-blue-800" };
                        a class=(class) href=(format!("/?{}={}", param, urlencoding::encode(url))) { (name) }
                    }
                }
            }
        }
    }
}

fn movie_card(movie: &movie::Model, media_url: &str) -> Markup {
    html! {
        a class="block bg-white shadow rounded-lg p-4 hover:shadow-md" href=(format!("/movies/{}", urlencoding::encode(&movie.url))) {
            img class="w-full rounded" src=(media(media_url, &movie.poster)) alt=(movie.title);
            h2 class="mt-3 text-lg font-semibold text-gray-900" { (movie.title) }
            p class="text-sm text-gray-500" { (movie.year) " · " (movie.country) }
            @if !movie.tagline.is_empty() {
                p class="mt-1 text-sm text-gray-600" { (movie.tagline) }
            }
        }
    }
}

fn review_thread(node: &ReviewNode) -> Markup {
    html! {
        div class="border-l-4 border-blue-500 pl-4" {
            p class="text-sm font-medium text-gray-900" { (node.review.name) }
            p class="mt-1 text-sm text-gray-700 whitespace-pre-line" { (node.review.text) }
            @if !node.replies.is_empty() {
                div class="mt-3 ml-4 space-y-3" {
                    @for reply in &node.replies {
                        (review_thread(reply))
                    }
                }
            }
        }
    }
}

fn fact(label: &str, value: &str) -> Markup {
    html! {
        p class="text-sm text-gray-700" {
            span class="font-medium" { (label) ": " }
            @if value.is_empty() { "—" } @else { (value) }
        }
    }
}

fn media(media_url: &str, path: &str) -> String {
    format!("{media_url}{path}")
}

fn join<'a>(names: impl Iterator<Item = &'a str>) -> String {
    names.collect::<Vec<_>>().join(", ")
}

/// `$1,234,567`.
fn format_usd(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 2);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if amount < 0 { format!("-${out}") } else { format!("${out}") }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RatingSummary;

    fn movie() -> movie::Model {
        movie::Model {
            id: 1,
            title: "Inception".into(),
            tagline: "Your mind is the scene of the crime".into(),
            description: "Dreams".into(),
            poster: "movies/inception.jpg".into(),
            year: 2010,
            country: "USA".into(),
            world_premiere: "2010-07-08".into(),
            budget: 160_000_000,
            fees_in_usa: 292_576_195,
            fees_in_world: 828_322_032,
            category_id: None,
            url: "inception".into(),
            draft: false,
        }
    }

    #[test]
    fn usd_amounts_are_grouped() {
        assert_eq!(format_usd(0), "$0");
        assert_eq!(format_usd(999), "$999");
        assert_eq!(format_usd(160_000_000), "$160,000,000");
        assert_eq!(format_usd(1_234), "$1,234");
    }

    #[test]
    fn movie_page_renders_threads_and_media_paths() {
        let reply = ReviewNode {
            review: crate::entities::reviews::Model {
                id: 2,
                email: "b@example.com".into(),
                name: "Bob".into(),
                text: "Agreed".into(),
                parent_id: Some(1),
                movie_id: 1,
            },
            replies: Vec::new(),
        };
        let root = ReviewNode {
            review: crate::entities::reviews::Model {
                id: 1,
                email: "a@example.com".into(),
                name: "Ann".into(),
                text: "<b>Great</b>".into(),
                parent_id: None,
                movie_id: 1,
            },
            replies: vec![reply],
        };
        let detail = MovieDetail {
            movie: movie(),
            category: None,
            directors: Vec::new(),
            actors: Vec::new(),
            genres: Vec::new(),
            shots: Vec::new(),
            rating: RatingSummary { votes: 2, average: Some(4.5) },
            reviews: vec![root],
        };

        let html = movie_page(&detail, "/media/");
        assert!(html.contains("/media/movies/inception.jpg"));
        assert!(html.contains("$160,000,000"));
        assert!(html.contains("4.5 (2 votes)"));
        assert!(html.contains("Bob"));
        assert!(html.contains("&lt;b&gt;Great&lt;/b&gt;"));
    }

    #[test]
    fn index_marks_selected_genre() {
        let genres = vec![genre::Model {
            id: 1,
            name: "Drama".into(),
            description: "".into(),
            url: "drama".into(),
        }];
        let html = index_page(
            &[movie()],
            &[],
            &genres,
            ListSelection { category: None, genre: Some("drama") },
            "/media/",
        );
        assert!(html.contains("href=\"/?genre=drama\""));
        assert!(html.contains("href=\"/movies/inception\""));
        assert!(html.contains("All movies"));
    }
}
