use kaleido_client::ImageService;

/// Shared application state, available to all route handlers via
/// `State<Arc<AppState<..>>>`.
///
/// Generic over the outbound seams (portal, image store, image origin, LLM
/// backend) so integration tests can run the real router against mocks.
pub struct AppState<P, S, O, L> {
    pub portal: P,
    pub images: ImageService<S, O>,
    pub llm: L,
}
