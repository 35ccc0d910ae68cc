use embedding_engine::GeminiEmbeddings;
use llm_interface::{GeminiProvider, GenerationOptions};
use opinion_analysis::{AnalysisEngine, AnalysisService, ChatService};
use opinionlens_core::{AppConfig, ConfigError, CoreError, ErrorReporter};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use vector_store::InMemoryVectorStore;
use youtube_client::YouTubeClient;

#[tokio::main]
async fn main() -> Result<(), CoreError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "opinionlens=info,opinion_analysis=info".into()),
        )
        .init();

    tracing::info!("Starting Opinionlens - video comment opinion analysis");

    let config = AppConfig::load()?;
    let youtube_api_key = config.youtube_api_key.clone().ok_or_else(|| {
        CoreError::Config(ConfigError::MissingEnvironmentVariable {
            var_name: "YOUTUBE_API_KEY".to_string(),
        })
    })?;
    let gemini_api_key = config.gemini_api_key.clone().ok_or_else(|| {
        CoreError::Config(ConfigError::MissingEnvironmentVariable {
            var_name: "GEMINI_API_KEY".to_string(),
        })
    })?;

    let source = Arc::new(YouTubeClient::new(youtube_api_key));
    let embedder = Arc::new(GeminiEmbeddings::new(
        gemini_api_key.clone(),
        config.embedding_model.clone(),
    ));
    let llm = Arc::new(GeminiProvider::new(
        gemini_api_key,
        config.llm_model.clone(),
        GenerationOptions {
            temperature: config.temperature,
            max_output_tokens: config.max_tokens,
        },
    ));
    let store = Arc::new(InMemoryVectorStore::new());

    let engine = Arc::new(AnalysisEngine::new(
        source,
        embedder,
        llm,
        store,
        &config,
    ));
    let analysis = Arc::new(AnalysisService::new(engine.clone()));
    let chat = ChatService::new(engine, analysis.clone());

    let reporter = ErrorReporter::new();
    let conversation_id = uuid::Uuid::new_v4().to_string();

    println!("Opinionlens ready. Commands:");
    println!("  /collect <topic>    collect comments for a topic");
    println!("  /analyze <query>    analyze opinion across collected comments");
    println!("  /overview <topic>   summarize one topic");
    println!("  /topics             list collected topics");
    println!("  /clear <topic>      delete a topic's comments");
    println!("  /stats              system statistics");
    println!("  /quit               exit");
    println!("Anything else is treated as a chat message (paste a video link to analyze it).");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        prompt().await?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        match input.split_once(' ') {
            Some(("/collect", topic)) => {
                match analysis
                    .collect_topic_comments(
                        topic.trim(),
                        config.max_videos_per_search,
                        config.max_comments_per_video,
                    )
                    .await
                {
                    Ok(summary) => println!(
                        "Collected {} comments ({} chunks indexed) for '{}'",
                        summary.collected_comments, summary.processed_chunks, summary.topic
                    ),
                    Err(e) => reporter.report_error(&e),
                }
            }
            Some(("/analyze", query)) => {
                match analysis.analyze_topic_opinion(query.trim(), None, true).await {
                    Ok((analysis_text, result)) => {
                        println!("{}\n", analysis_text);
                        println!(
                            "Sentiment: {:.1}% positive / {:.1}% negative / {:.1}% neutral over {} comments",
                            result.sentiment_stats.positive * 100.0,
                            result.sentiment_stats.negative * 100.0,
                            result.sentiment_stats.neutral * 100.0,
                            result.total_relevant_comments
                        );
                        if !result.keywords.is_empty() {
                            println!("Keywords: {}", result.keywords.join(", "));
                        }
                        for comment in &result.representative_comments {
                            println!(
                                "  [{:.2}] {} ({} likes): {}",
                                comment.combined_score,
                                comment.author,
                                comment.like_count,
                                comment.content
                            );
                        }
                    }
                    Err(e) => reporter.report_error(&e),
                }
            }
            Some(("/overview", topic)) => match analysis.get_topic_overview(topic.trim()).await {
                Ok(overview) => {
                    println!(
                        "Topic '{}': {} comments, dominant sentiment {}",
                        overview.topic,
                        overview.total_comments,
                        overview.sentiment_overview.dominant()
                    );
                    if !overview.top_keywords.is_empty() {
                        println!("Top keywords: {}", overview.top_keywords.join(", "));
                    }
                }
                Err(e) => reporter.report_error(&e),
            },
            Some(("/clear", topic)) => match analysis.clear_topic_data(topic.trim()).await {
                Ok(()) => println!("Cleared data for '{}'", topic.trim()),
                Err(e) => reporter.report_error(&e),
            },
            None if input == "/topics" => {
                let topics = analysis.get_collected_topics().await;
                if topics.is_empty() {
                    println!("No topics collected yet.");
                } else {
                    println!("Collected topics: {}", topics.join(", "));
                }
            }
            None if input == "/stats" => match analysis.get_system_stats().await {
                Ok(stats) => println!(
                    "{} stored comments | embeddings: {} | store: {} | status: {}",
                    stats.system.total_stored_comments,
                    stats.system.embedding_model,
                    stats.system.vector_store_type,
                    stats.system.status
                ),
                Err(e) => reporter.report_error(&e),
            },
            None if input == "/quit" || input == "/exit" => break,
            _ => {
                let (response, sources) =
                    chat.process_message(input, &conversation_id, true).await;
                println!("{}", response);
                if let Some(sources) = sources {
                    println!("Sources: {}", sources.join(", "));
                }
            }
        }
    }

    tracing::info!("Shutting down");
    Ok(())
}

async fn prompt() -> Result<(), CoreError> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(b"> ").await?;
    stdout.flush().await?;
    Ok(())
}
