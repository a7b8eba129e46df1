//! Tracer configuration.
use crate::trace::{IdGenerator, NoopRecorder, RandomIdGenerator, Recorder, Sampler, ShouldSample};

/// Configuration a [`Tracer`] is built from.
///
/// There is no process-wide default tracer; call sites receive an explicit
/// `Tracer` constructed from one of these.
///
/// [`Tracer`]: crate::trace::Tracer
#[derive(Debug)]
pub struct Config {
    /// The sampler consulted once per trace, at root-span creation.
    pub sampler: Box<dyn ShouldSample>,
    /// The generator for trace and span ids.
    pub id_generator: Box<dyn IdGenerator>,
    /// The sink that receives finished, sampled spans.
    pub recorder: Box<dyn Recorder>,
}

impl Config {
    /// Specify the sampler to be used.
    pub fn with_sampler<T: ShouldSample + 'static>(mut self, sampler: T) -> Self {
        self.sampler = Box::new(sampler);
        self
    }

    /// Specify the id generator to be used.
    pub fn with_id_generator<T: IdGenerator + 'static>(mut self, id_generator: T) -> Self {
        self.id_generator = Box::new(id_generator);
        self
    }

    /// Specify the recorder to be used.
    pub fn with_recorder<T: Recorder + 'static>(mut self, recorder: T) -> Self {
        self.recorder = Box::new(recorder);
        self
    }
}

impl Default for Config {
    /// Sample everything, random ids, drop every span.
    fn default() -> Self {
        Config {
            sampler: Box::new(Sampler::AlwaysOn),
            id_generator: Box::new(RandomIdGenerator::default()),
            recorder: Box::new(NoopRecorder::new()),
        }
    }
}
